//! Lookup of adapters by entity type name

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::error::{FieldSealError, FieldSealResult};

use super::{EntityAdapter, RecurringTransactionAdapter, RoutineAdapter, TransactionAdapter};

/// The set of entity types the engine knows how to protect
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn EntityAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter, tuned by settings
    pub fn standard(settings: &Settings) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TransactionAdapter::new(
            settings.reference_min_length,
        )));
        registry.register(Arc::new(RecurringTransactionAdapter::new()));
        registry.register(Arc::new(RoutineAdapter::new()));
        registry
    }

    /// Add an adapter, replacing any with the same entity type
    pub fn register(&mut self, adapter: Arc<dyn EntityAdapter>) {
        self.adapters
            .retain(|a| a.entity_type() != adapter.entity_type());
        self.adapters.push(adapter);
    }

    /// Find the adapter for an entity type
    pub fn get(&self, entity_type: &str) -> FieldSealResult<Arc<dyn EntityAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.entity_type() == entity_type)
            .cloned()
            .ok_or_else(|| FieldSealError::UnknownEntity(entity_type.to_string()))
    }

    /// Iterate over registered adapters in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EntityAdapter>> {
        self.adapters.iter()
    }

    /// Registered entity type names
    pub fn entity_types(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.entity_type()).collect()
    }
}
