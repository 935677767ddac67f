//! Application state shared across handlers.

use std::sync::Arc;

use crate::metrics::MetricsEngine;
use crate::store::OrderStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Handlers only need the metrics engine;
/// the store is reached through it.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    engine: MetricsEngine,
}

impl AppState {
    /// Create a new application state around a metrics engine.
    #[must_use]
    pub fn new(engine: MetricsEngine) -> Self {
        Self {
            inner: Arc::new(AppStateInner { engine }),
        }
    }

    /// Get a reference to the metrics engine.
    #[must_use]
    pub fn engine(&self) -> &MetricsEngine {
        &self.inner.engine
    }

    /// Get a reference to the underlying order store.
    #[must_use]
    pub fn store(&self) -> &dyn OrderStore {
        self.inner.engine.store()
    }
}
