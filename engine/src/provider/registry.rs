//! Dependency-injected provider registry
//!
//! Constructed once at startup and handed to the aggregator and
//! controllers; there is no ambient global provider state.

use indexmap::IndexMap;
use std::sync::Arc;

use super::service::GeoDataProvider;

/// Registry of configured data providers, keyed by provider id
#[derive(Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, Arc<dyn GeoDataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its descriptor id. Replaces any
    /// previous registration with the same id.
    pub fn register(&mut self, provider: Arc<dyn GeoDataProvider>) {
        let id = provider.descriptor().id.clone();
        self.providers.insert(id, provider);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn GeoDataProvider>> {
        self.providers.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider ids in registration order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}
