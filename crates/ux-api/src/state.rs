use std::sync::Arc;

use ux_core::{
    ApiKeyValidator, DisabledNarrator, MonitorConfig, MonitorScheduler, PrefixKeyValidator,
    ScanEngine, Scanner, SiteRegistry,
};

#[derive(Clone)]
pub struct AppState {
    pub registry: SiteRegistry,
    pub scanner: Arc<dyn Scanner>,
    pub scheduler: Arc<MonitorScheduler>,
    pub validator: Arc<dyn ApiKeyValidator>,
}

impl AppState {
    pub fn new(
        registry: SiteRegistry,
        scanner: Arc<dyn Scanner>,
        scheduler: Arc<MonitorScheduler>,
    ) -> Self {
        Self {
            registry,
            scanner,
            scheduler,
            validator: Arc::new(PrefixKeyValidator),
        }
    }

    /// Default wiring: default config, no narrative credential, scheduler not
    /// yet started.
    pub fn with_defaults() -> Self {
        let config = MonitorConfig::default();
        let registry = SiteRegistry::new();
        let scanner: Arc<dyn Scanner> =
            Arc::new(ScanEngine::new(Arc::new(DisabledNarrator), &config));
        let scheduler = Arc::new(MonitorScheduler::new(
            registry.clone(),
            Arc::clone(&scanner),
            &config,
            None,
        ));
        Self::new(registry, scanner, scheduler)
    }

    pub fn with_validator(mut self, validator: Arc<dyn ApiKeyValidator>) -> Self {
        self.validator = validator;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_defaults()
    }
}
