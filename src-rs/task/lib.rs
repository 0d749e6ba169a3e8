pub mod store;
pub mod types;

pub use store::{SortOrder, StoreError, TaskStore};
pub use types::{NewTask, Task, TaskPatch, TaskStatus};
