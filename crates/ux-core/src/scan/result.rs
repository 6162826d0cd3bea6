use serde::{Deserialize, Serialize};

/// The four audited categories with their latest scores, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub performance: u8,
    pub accessibility: u8,
    pub best_practices: u8,
    pub seo: u8,
}

impl CategoryScores {
    /// Overall score: the category sum divided by 4, truncated.
    pub fn overall(&self) -> u8 {
        let sum = u16::from(self.performance)
            + u16::from(self.accessibility)
            + u16::from(self.best_practices)
            + u16::from(self.seo);
        (sum / 4) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A positive finding from the strength catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthFinding {
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// A negative finding from the weakness catalog, with a remediation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeaknessFinding {
    pub severity: Severity,
    pub title: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
}

/// The structured output of one audit invocation. Produced fresh per scan,
/// never stored beyond the overall score.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub url: String,
    /// Formatted as `"YYYY-MM-DD HH:MM UTC"`.
    pub timestamp: String,
    pub score: u8,
    pub categories: CategoryScores,
    pub summary: String,
    pub strengths: Vec<StrengthFinding>,
    pub weaknesses: Vec<WeaknessFinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overall_truncates_toward_zero() {
        let categories = CategoryScores {
            performance: 75,
            accessibility: 65,
            best_practices: 80,
            seo: 71,
        };
        // 291 / 4 = 72.75, truncated to 72.
        assert_eq!(categories.overall(), 72);
    }

    #[test]
    fn overall_at_maximum_bounds() {
        let categories = CategoryScores {
            performance: 98,
            accessibility: 90,
            best_practices: 100,
            seo: 95,
        };
        assert_eq!(categories.overall(), 95);
    }

    #[test]
    fn severity_serializes_capitalized() {
        assert_eq!(serde_json::to_value(Severity::High).unwrap(), "High");
        assert_eq!(serde_json::to_value(Severity::Low).unwrap(), "Low");
    }
}
