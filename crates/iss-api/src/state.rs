//! Shared application state for the API server.

use iss_core::EpochStore;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. The store loads itself on first use, so handlers never
/// need to coordinate the load.
pub struct AppState {
    /// The epoch store every endpoint reads from.
    pub store: EpochStore,
}

impl AppState {
    /// Create the application state around a (possibly unloaded) store.
    pub const fn new(store: EpochStore) -> Self {
        Self { store }
    }
}
