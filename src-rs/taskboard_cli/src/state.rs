//! View state for the two client pages.
//!
//! State only changes through the transitions below. Each transition that
//! talks to the server returns the toast to show; on failure the state is
//! left exactly as it was before the call.

use serde::Serialize;

use crate::client::{ClientError, TaskApi};
use crate::models::{NewTaskRequest, Task, TaskPatch, TaskStatus, Toast};

/// Terminal width below which tasks render as cards.
pub const CARD_BREAKPOINT: u16 = 80;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Page {
    Dashboard,
    CreateTask,
}

/// Derived from the observed width on every render, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    Table,
    Cards,
}

impl Layout {
    pub fn from_width(width: u16) -> Self {
        if width < CARD_BREAKPOINT {
            Layout::Cards
        } else {
            Layout::Table
        }
    }
}

/// Snapshot of the task under edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditSession {
    pub task_id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Dashboard {
    pub tasks: Vec<Task>,
    pub editing: Option<EditSession>,
    pub open_popover_id: Option<String>,
    /// False until the first fetch has been attempted.
    pub loaded: bool,
}

impl Dashboard {
    /// Fetches the task list once. The previous view state is discarded.
    pub fn mount(&mut self, api: &impl TaskApi) -> Option<Toast> {
        *self = Dashboard {
            loaded: true,
            ..Dashboard::default()
        };

        match api.list_tasks() {
            Ok(tasks) if tasks.is_empty() => Some(Toast::warning("No existing tasks")),
            Ok(tasks) => {
                self.tasks = tasks;
                None
            }
            Err(ClientError::Http { .. }) => Some(Toast::error("Failed to fetch tasks.")),
            Err(ClientError::Transport(_)) => Some(Toast::error("Error fetching tasks.")),
        }
    }

    /// Looks a task up by its 1-based position in the list.
    pub fn task_at(&self, position: usize) -> Option<&Task> {
        position.checked_sub(1).and_then(|idx| self.tasks.get(idx))
    }

    pub fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn is_editing(&self, id: &str) -> bool {
        self.editing.as_ref().is_some_and(|session| session.task_id == id)
    }

    /// Starts editing `id`, replacing any other edit in progress.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        let Some(task) = self.find(id) else {
            return false;
        };
        self.editing = Some(EditSession {
            task_id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
        });
        true
    }

    pub fn set_edit_title(&mut self, value: &str) -> bool {
        match &mut self.editing {
            Some(session) => {
                session.title = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn set_edit_description(&mut self, value: &str) -> bool {
        match &mut self.editing {
            Some(session) => {
                session.description = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Sends title and description of the edit buffer.
    pub fn save_edit(&mut self, api: &impl TaskApi) -> Option<Toast> {
        let session = self.editing.as_ref()?;
        if session.title.is_empty() || session.description.is_empty() {
            return Some(Toast::error("All fields are required."));
        }

        let task_id = session.task_id.clone();
        let patch = TaskPatch {
            title: Some(session.title.clone()),
            description: Some(session.description.clone()),
            status: None,
        };
        match api.update_task(&task_id, &patch) {
            Ok(updated) => {
                self.merge(updated);
                self.editing = None;
                Some(Toast::success("Task updated successfully."))
            }
            Err(ClientError::Http { .. }) => Some(Toast::error("Failed to update task.")),
            Err(ClientError::Transport(_)) => Some(Toast::error("Error updating task.")),
        }
    }

    /// Opens the status popover for `id`, closing any other one.
    pub fn open_popover(&mut self, id: &str) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        self.open_popover_id = Some(id.to_string());
        true
    }

    pub fn close_popover(&mut self) {
        self.open_popover_id = None;
    }

    pub fn select_status(&mut self, api: &impl TaskApi, id: &str, status: TaskStatus) -> Toast {
        let patch = TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        };
        match api.update_task(id, &patch) {
            Ok(updated) => {
                if let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) {
                    task.status = updated.status;
                }
                self.open_popover_id = None;
                Toast::success("Task status updated.")
            }
            Err(ClientError::Http { .. }) => Toast::error("Failed to update status."),
            Err(ClientError::Transport(_)) => Toast::error("Error updating status."),
        }
    }

    pub fn delete(&mut self, api: &impl TaskApi, id: &str) -> Toast {
        match api.delete_task(id) {
            Ok(()) => {
                self.tasks.retain(|task| task.id != id);
                if self.is_editing(id) {
                    self.editing = None;
                }
                if self.open_popover_id.as_deref() == Some(id) {
                    self.open_popover_id = None;
                }
                Toast::success("Task deleted successfully.")
            }
            Err(ClientError::Http { .. }) => Toast::error("Failed to delete task."),
            Err(ClientError::Transport(_)) => Toast::error("Error deleting task."),
        }
    }

    fn merge(&mut self, updated: Task) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == updated.id) {
            task.title = updated.title;
            task.description = updated.description;
            task.status = updated.status;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CreateForm {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
}

impl CreateForm {
    /// `Ok` carries the success toast and means the caller should navigate
    /// back to the dashboard. The form is cleared only on success.
    pub fn submit(&mut self, api: &impl TaskApi) -> Result<Toast, Toast> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(Toast::error("All fields are required"));
        }

        let req = NewTaskRequest {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
        };
        match api.create_task(&req) {
            Ok(_) => {
                *self = CreateForm::default();
                Ok(Toast::success("Task created successfully!"))
            }
            Err(ClientError::Http { msg, .. }) => {
                Err(Toast::error(msg.unwrap_or_else(|| "Failed to create task".to_string())))
            }
            Err(ClientError::Transport(_)) => Err(Toast::error("Something went wrong")),
        }
    }
}
