pub mod config;

#[path = "task/lib.rs"]
pub mod task;
#[path = "api/lib.rs"]
pub mod api;

pub use api::{build_router, AppError, AppState, TaskServer};
pub use config::{ServerConfig, StoreLocation};
pub use task::{NewTask, SortOrder, Task, TaskPatch, TaskStatus, TaskStore};
