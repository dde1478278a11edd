//! Application state for the API server

use crate::{Config, ExportService};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the export service and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The export orchestrator
    pub service: Arc<ExportService>,

    /// Configuration (read access)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<ExportService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
