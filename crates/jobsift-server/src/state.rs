use jobsift_core::SourceConfig;
use jobsift_core::models::SourceMode;
use jobsift_db::Database;
use tokio_util::task::TaskTracker;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub sources: SourceConfig,
    /// Acquisition path used when a request does not name one.
    pub default_mode: SourceMode,
    /// Background search runs; awaited on shutdown.
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(db: Database, sources: SourceConfig, default_mode: SourceMode) -> Self {
        Self {
            db,
            sources,
            default_mode,
            tasks: TaskTracker::new(),
        }
    }
}
