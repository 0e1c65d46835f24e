//! Ordered strategy registry.
//!
//! Both payment services and risk providers are resolved the same way: walk
//! the registered factories in registration order and take the first that
//! accepts the request. The registry is an explicit object handed to whoever
//! needs it; there is no global instance.
//!
//! # Thread Safety
//!
//! The registry uses `RwLock` for thread-safe access and recovers from lock
//! poisoning, since the factory list is never left half-updated.

use std::sync::{Arc, RwLock};

/// First-match-wins list of factories.
pub struct StrategyRegistry<F: ?Sized> {
    factories: RwLock<Vec<Arc<F>>>,
}

impl<F: ?Sized> StrategyRegistry<F> {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(Vec::new()),
        }
    }

    /// Creates a registry from an explicit factory list, keeping its order.
    pub fn from_factories(factories: Vec<Arc<F>>) -> Self {
        Self {
            factories: RwLock::new(factories),
        }
    }

    /// Appends a factory. Earlier registrations win over later ones.
    pub fn register(&self, factory: Arc<F>) {
        let mut factories = self.factories.write().unwrap_or_else(|e| e.into_inner());
        factories.push(factory);
    }

    /// Returns the first factory accepted by `predicate`.
    pub fn find<P>(&self, predicate: P) -> Option<Arc<F>>
    where
        P: Fn(&F) -> bool,
    {
        let factories = self.factories.read().unwrap_or_else(|e| e.into_inner());
        factories.iter().find(|f| predicate(f.as_ref())).cloned()
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        let factories = self.factories.read().unwrap_or_else(|e| e.into_inner());
        factories.len()
    }

    /// Returns true if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<F: ?Sized> Default for StrategyRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
