use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::types::{NewTask, Task, TaskPatch, TaskStatus};
use crate::config::StoreLocation;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A document violates the task schema.
    #[error("{0}")]
    Validation(String),

    #[error("store io error: {0}")]
    Io(#[from] io::Error),

    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

struct Record {
    seq: u64,
    task: Task,
}

#[derive(Default)]
struct Collection {
    next_seq: u64,
    records: HashMap<String, Record>,
}

impl Collection {
    fn sorted(&self, order: SortOrder) -> Vec<&Record> {
        let mut items: Vec<&Record> = self.records.values().collect();
        items.sort_by(|a, b| (a.task.created_at, a.seq).cmp(&(b.task.created_at, b.seq)));
        if order == SortOrder::NewestFirst {
            items.reverse();
        }
        items
    }

    fn push(&mut self, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.insert(task.id.clone(), Record { seq, task });
    }
}

/// Flat task collection keyed by generated id.
///
/// Every mutation holds the write lock for its whole duration, including the
/// write-back to disk for file-backed stores, so single-document changes are
/// atomic. A failed write-back rolls the in-memory change back.
pub struct TaskStore {
    path: Option<PathBuf>,
    tasks: RwLock<Collection>,
}

impl TaskStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            tasks: RwLock::new(Collection::default()),
        }
    }

    /// Opens a JSON document file. A missing file is an empty collection,
    /// a file repeating an id is refused.
    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut collection = Collection::default();
        for task in load_from_disk(&path)? {
            if collection.records.contains_key(&task.id) {
                return Err(StoreError::Validation(format!(
                    "duplicate task id `{}` in {}",
                    task.id,
                    path.display()
                )));
            }
            collection.push(task);
        }
        info!(path = %path.display(), tasks = collection.records.len(), "opened task file");
        Ok(Self {
            path: Some(path),
            tasks: RwLock::new(collection),
        })
    }

    pub fn open(location: &StoreLocation) -> Result<Self, StoreError> {
        match location {
            StoreLocation::Memory => Ok(Self::in_memory()),
            StoreLocation::File(path) => Self::open_file(path.clone()),
        }
    }

    pub fn insert(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let title = required("Title", new_task.title)?;
        let description = required("Description", new_task.description)?;
        let status = parse_status(&new_task.status)?;

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title,
            description,
            status,
            created_at: now,
            updated_at: now,
        };

        let mut collection = self.write()?;
        collection.push(task.clone());
        if let Err(err) = self.save(&collection) {
            collection.records.remove(&task.id);
            collection.next_seq -= 1;
            return Err(err);
        }
        debug!(id = %task.id, "inserted task");
        Ok(task)
    }

    pub fn find_all(&self, order: SortOrder) -> Result<Vec<Task>, StoreError> {
        let collection = self.read()?;
        Ok(collection
            .sorted(order)
            .into_iter()
            .map(|record| record.task.clone())
            .collect())
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let collection = self.read()?;
        Ok(collection.records.get(id).map(|record| record.task.clone()))
    }

    /// Applies `patch` to the task with `id` and returns the updated task.
    ///
    /// Supplied fields are validated before the lookup, so an invalid patch
    /// fails even when the id is unknown.
    pub fn find_by_id_and_update(
        &self,
        id: &str,
        patch: TaskPatch,
    ) -> Result<Option<Task>, StoreError> {
        let title = patch.title.map(|t| required("Title", t)).transpose()?;
        let description = patch
            .description
            .map(|d| required("Description", d))
            .transpose()?;
        let status = patch.status.as_deref().map(parse_status).transpose()?;

        let mut collection = self.write()?;
        let Some(record) = collection.records.get_mut(id) else {
            return Ok(None);
        };

        let previous = record.task.clone();
        if let Some(title) = title {
            record.task.title = title;
        }
        if let Some(description) = description {
            record.task.description = description;
        }
        if let Some(status) = status {
            record.task.status = status;
        }
        record.task.updated_at = Utc::now();
        let updated = record.task.clone();

        if let Err(err) = self.save(&collection) {
            if let Some(record) = collection.records.get_mut(id) {
                record.task = previous;
            }
            return Err(err);
        }
        debug!(id, "updated task");
        Ok(Some(updated))
    }

    pub fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let mut collection = self.write()?;
        let Some(record) = collection.records.remove(id) else {
            return Ok(None);
        };

        if let Err(err) = self.save(&collection) {
            collection.records.insert(id.to_string(), record);
            return Err(err);
        }
        debug!(id, "deleted task");
        Ok(Some(record.task))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collection>, StoreError> {
        self.tasks.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collection>, StoreError> {
        self.tasks.write().map_err(|_| StoreError::Poisoned)
    }

    fn save(&self, collection: &Collection) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let list: Vec<&Task> = collection
            .sorted(SortOrder::OldestFirst)
            .into_iter()
            .map(|record| &record.task)
            .collect();
        let serialized = serde_json::to_string_pretty(&list)?;

        let staging = path.with_extension("json.tmp");
        fs::write(&staging, serialized)?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

fn load_from_disk(path: &Path) -> Result<Vec<Task>, StoreError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str::<Vec<Task>>(&data)?)
}

fn required(field: &str, value: String) -> Result<String, StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{field} is required.")));
    }
    Ok(value)
}

fn parse_status(raw: &str) -> Result<TaskStatus, StoreError> {
    raw.parse::<TaskStatus>()
        .map_err(|err| StoreError::Validation(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn new_task(title: &str, description: &str, status: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: description.to_string(),
            status: status.to_string(),
        }
    }

    fn count(store: &TaskStore) -> usize {
        store.find_all(SortOrder::NewestFirst).unwrap().len()
    }

    #[fixture]
    fn store() -> TaskStore {
        TaskStore::in_memory()
    }

    #[rstest]
    fn insert_assigns_id_and_timestamps(store: TaskStore) {
        let task = store.insert(new_task("Buy milk", "2%", "pending")).unwrap();

        assert!(!task.id.is_empty());
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(store.find_by_id(&task.id).unwrap(), Some(task));
    }

    #[rstest]
    fn insert_generates_unique_ids(store: TaskStore) {
        let a = store.insert(new_task("a", "a", "pending")).unwrap();
        let b = store.insert(new_task("a", "a", "pending")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(count(&store), 2);
    }

    #[rstest]
    #[case(new_task("", "d", "pending"), "Title is required.")]
    #[case(new_task("t", "", "pending"), "Description is required.")]
    #[case(new_task("t", "d", "archived"), "`archived` is not a valid status.")]
    fn insert_enforces_schema(store: TaskStore, #[case] input: NewTask, #[case] message: &str) {
        match store.insert(input) {
            Err(StoreError::Validation(msg)) => assert_eq!(msg, message),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(count(&store), 0);
    }

    #[rstest]
    fn find_all_orders_by_creation(store: TaskStore) {
        let first = store.insert(new_task("first", "1", "pending")).unwrap();
        let second = store.insert(new_task("second", "2", "pending")).unwrap();
        let third = store.insert(new_task("third", "3", "completed")).unwrap();

        let newest: Vec<String> = store
            .find_all(SortOrder::NewestFirst)
            .unwrap()
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(newest, vec![third.id.clone(), second.id.clone(), first.id.clone()]);

        let oldest: Vec<String> = store
            .find_all(SortOrder::OldestFirst)
            .unwrap()
            .into_iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(oldest, vec![first.id, second.id, third.id]);
    }

    #[rstest]
    fn update_changes_only_supplied_fields(store: TaskStore) {
        let task = store.insert(new_task("Buy milk", "2%", "pending")).unwrap();

        let patch = TaskPatch {
            status: Some("completed".to_string()),
            ..TaskPatch::default()
        };
        let updated = store.find_by_id_and_update(&task.id, patch).unwrap().unwrap();

        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Buy milk");
        assert_eq!(updated.description, "2%");
        assert_eq!(updated.created_at, task.created_at);
        assert!(updated.updated_at >= task.updated_at);
    }

    #[rstest]
    fn update_unknown_id_returns_none(store: TaskStore) {
        let patch = TaskPatch {
            title: Some("x".to_string()),
            ..TaskPatch::default()
        };
        let missing = Uuid::new_v4().to_string();
        assert_eq!(store.find_by_id_and_update(&missing, patch).unwrap(), None);
        assert_eq!(count(&store), 0);
    }

    #[rstest]
    #[case(TaskPatch { title: Some(String::new()), ..TaskPatch::default() })]
    #[case(TaskPatch { description: Some(String::new()), ..TaskPatch::default() })]
    #[case(TaskPatch { status: Some("later".to_string()), ..TaskPatch::default() })]
    fn update_runs_validators(store: TaskStore, #[case] patch: TaskPatch) {
        let task = store.insert(new_task("t", "d", "pending")).unwrap();

        let result = store.find_by_id_and_update(&task.id, patch);
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert_eq!(store.find_by_id(&task.id).unwrap(), Some(task));
    }

    #[rstest]
    fn delete_removes_once(store: TaskStore) {
        let task = store.insert(new_task("t", "d", "pending")).unwrap();

        assert_eq!(store.find_by_id_and_delete(&task.id).unwrap(), Some(task.clone()));
        assert_eq!(store.find_by_id_and_delete(&task.id).unwrap(), None);
        assert!(store.find_all(SortOrder::NewestFirst).unwrap().is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let (kept, updated) = {
            let store = TaskStore::open_file(&path).unwrap();
            let kept = store.insert(new_task("kept", "k", "pending")).unwrap();
            let gone = store.insert(new_task("gone", "g", "pending")).unwrap();
            let later = store.insert(new_task("later", "l", "pending")).unwrap();
            store.find_by_id_and_delete(&gone.id).unwrap();
            let patch = TaskPatch {
                status: Some("completed".to_string()),
                ..TaskPatch::default()
            };
            let updated = store.find_by_id_and_update(&later.id, patch).unwrap().unwrap();
            (kept, updated)
        };

        let reopened = TaskStore::open_file(&path).unwrap();
        assert_eq!(
            reopened.find_all(SortOrder::NewestFirst).unwrap(),
            vec![updated, kept]
        );
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::open_file(dir.path().join("absent.json")).unwrap();
        assert_eq!(count(&store), 0);
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            TaskStore::open_file(&path),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn repeated_id_in_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let now = Utc::now();
        let task = |title: &str| Task {
            id: "same".to_string(),
            title: title.to_string(),
            description: "d".to_string(),
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        fs::write(&path, serde_json::to_string(&vec![task("first"), task("second")]).unwrap()).unwrap();

        match TaskStore::open_file(&path) {
            Err(StoreError::Validation(msg)) => assert!(msg.contains("`same`")),
            Err(other) => panic!("expected validation error, got {other:?}"),
            Ok(_) => panic!("expected validation error, store opened"),
        }
    }

    #[test]
    fn failed_write_back_rolls_back_insert() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("tasks.json");
        let store = TaskStore::open_file(&path).unwrap();

        let result = store.insert(new_task("t", "d", "pending"));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert_eq!(count(&store), 0);
    }
}
