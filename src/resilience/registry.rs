//! Named breaker lookup for metrics reporting.
//!
//! Populated once at startup, read-only afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::resilience::circuit_breaker::BreakerHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no circuit breaker registered as '{0}'")]
    NotFound(String),

    #[error("a circuit breaker is already registered as '{0}'")]
    Duplicate(String),
}

/// Map from dependency name to its breaker.
#[derive(Default, Clone)]
pub struct BreakerRegistry {
    breakers: BTreeMap<String, Arc<dyn BreakerHandle>>,
}

impl BreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        breaker: Arc<dyn BreakerHandle>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.breakers.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        tracing::debug!(breaker = %name, "Circuit breaker registered");
        self.breakers.insert(name, breaker);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn BreakerHandle>, RegistryError> {
        self.breakers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// All breakers, ordered by name.
    pub fn all(&self) -> impl Iterator<Item = (&str, &Arc<dyn BreakerHandle>)> {
        self.breakers.iter().map(|(name, breaker)| (name.as_str(), breaker))
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
