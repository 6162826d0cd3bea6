//! Static finding catalogs. Reference data only; never mutated at runtime.
//! Each scan samples three entries without replacement from each catalog.

use super::result::{Severity, StrengthFinding, WeaknessFinding};

pub const STRENGTH_CATALOG: [StrengthFinding; 4] = [
    StrengthFinding {
        category: "Performance",
        title: "Excellent Logical Paint",
        description: "The Largest Contentful Paint (LCP) is under 1.2s, ensuring an immediate visual response for users.",
    },
    StrengthFinding {
        category: "Design",
        title: "Clear Visual Hierarchy",
        description: "Heading structures (H1-H3) are correctly implemented, facilitating easy scanning of content.",
    },
    StrengthFinding {
        category: "Security",
        title: "HTTPS Enforced",
        description: "All traffic is securely encrypted using modern TLS 1.3 protocols.",
    },
    StrengthFinding {
        category: "Mobile",
        title: "Responsive Viewport",
        description: "The layout adapts fluidly to mobile viewports without horizontal scrolling.",
    },
];

pub const WEAKNESS_CATALOG: [WeaknessFinding; 4] = [
    WeaknessFinding {
        severity: Severity::High,
        title: "Insufficient Color Contrast",
        description: "Primary text elements fall below the WCAG AA standard ratio of 4.5:1, impacting readability for low-vision users.",
        recommendation: "Darken the text color to #334155 (Slate-700) or higher.",
    },
    WeaknessFinding {
        severity: Severity::Medium,
        title: "Missing Non-Text Alternatives",
        description: "Several key navigation images lack 'alt' attributes, rendering them invisible to screen readers.",
        recommendation: "Audit all <img> tags and apply descriptive alt text.",
    },
    WeaknessFinding {
        severity: Severity::Medium,
        title: "Unoptimized JavaScript Chunks",
        description: "Large JS bundles are blocking the main thread for over 250ms, causing input delay.",
        recommendation: "Implement code-splitting and defer non-critical scripts.",
    },
    WeaknessFinding {
        severity: Severity::Low,
        title: "Tap Targets Too Small",
        description: "Mobile menu links have a hit area smaller than 48x48px, leading to potential 'fat finger' errors.",
        recommendation: "Increase padding on .nav-link elements.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_titles_are_distinct() {
        for catalog_titles in [
            STRENGTH_CATALOG.map(|s| s.title),
            WEAKNESS_CATALOG.map(|w| w.title),
        ] {
            let mut titles = catalog_titles.to_vec();
            titles.sort_unstable();
            titles.dedup();
            assert_eq!(titles.len(), 4);
        }
    }
}
