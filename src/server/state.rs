//! Server application state

use std::path::PathBuf;

use crate::upstream::UpstreamClient;

/// Shared application state for all route handlers.
///
/// Holds the upstream client (built once at startup) and the response log
/// path; handlers open their own short-lived log connections from it.
pub struct AppState {
    pub upstream: UpstreamClient,
    pub db_path: PathBuf,
}
