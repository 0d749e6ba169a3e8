use std::path::PathBuf;
use std::sync::Arc;

use crate::task::TaskStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    /// Built client assets served for non-API GET requests.
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: TaskStore, static_dir: Option<PathBuf>) -> Self {
        Self {
            store: Arc::new(store),
            static_dir,
        }
    }
}
