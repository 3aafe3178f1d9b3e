mod legacy;
mod local;

pub use local::FileStore;

use std::collections::HashSet;

use tracing::{info, warn};

use crate::activity::Activity;
use crate::config::{ACTIVITIES_BACKUP_KEY, ACTIVITIES_KEY, TODOS_KEY};
use crate::error::{AppError, AppResult};

/// Key-value storage collaborator. Two logical keys are in play: the
/// unified activity collection and the legacy to-do list it absorbs.
pub trait KeyValue: Send {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> AppResult<()>;
}

/// Whole-collection persistence for activities.
///
/// Storage is deliberately scheduling-free: it reads and writes the
/// serialized collection and nothing else, so it can be tested apart from
/// the notification side.
pub struct Storage {
    backend: Box<dyn KeyValue>,
}

impl Storage {
    pub fn new(backend: Box<dyn KeyValue>) -> Self {
        Self { backend }
    }

    /// Storage over the default on-disk location.
    pub fn open_default() -> AppResult<Self> {
        Ok(Self::new(Box::new(FileStore::open_default()?)))
    }

    /// Read the persisted collection, migrating legacy formats in place.
    ///
    /// Nothing persisted yet reads as an empty collection. Data that is
    /// neither current-format nor a known legacy format is a
    /// [`AppError::StorageRead`]; the caller falls back to an empty list
    /// and surfaces the error.
    pub fn load(&mut self) -> AppResult<Vec<Activity>> {
        let mut activities = self.load_activities()?;

        if self.fold_in_legacy_todos(&mut activities) {
            self.save(&activities)?;
            // The legacy key is cleared only once the unified collection
            // is durable
            if let Err(e) = self.backend.set(TODOS_KEY, "[]") {
                warn!("failed to clear legacy todo list: {}", e);
            }
        }

        Ok(activities)
    }

    /// Serialize and overwrite the entire persisted collection.
    pub fn save(&mut self, activities: &[Activity]) -> AppResult<()> {
        let content = serde_json::to_string_pretty(activities)
            .map_err(|e| AppError::storage_write(e.to_string()))?;
        self.backend.set(ACTIVITIES_KEY, &content)
    }

    fn load_activities(&mut self) -> AppResult<Vec<Activity>> {
        let content = match self.backend.get(ACTIVITIES_KEY)? {
            Some(content) => content,
            None => return Ok(Vec::new()),
        };

        // Try to parse as the current format first
        if let Ok(activities) = serde_json::from_str::<Vec<Activity>>(&content) {
            return Ok(activities);
        }

        // Try migration from the legacy field names, keeping a backup of
        // the raw data before rewriting it
        if let Some(mut migrated) = legacy::try_migrate_legacy_activities(&content) {
            warn!(count = migrated.len(), "migrating legacy activity data");
            renumber_conflicts(&mut migrated);
            if let Err(e) = self.backend.set(ACTIVITIES_BACKUP_KEY, &content) {
                warn!("failed to back up legacy activity data: {}", e);
            }
            self.save(&migrated)?;
            return Ok(migrated);
        }

        Err(AppError::storage_read("activity data is corrupt"))
    }

    /// Fold the legacy standalone to-do list into the activity collection.
    /// Returns true when anything was merged.
    fn fold_in_legacy_todos(&mut self, activities: &mut Vec<Activity>) -> bool {
        let content = match self.backend.get(TODOS_KEY) {
            Ok(Some(content)) => content,
            Ok(None) => return false,
            Err(e) => {
                warn!("failed to read legacy todo list: {}", e);
                return false;
            }
        };

        let todos = match legacy::try_migrate_legacy_todos(&content) {
            Some(todos) if !todos.is_empty() => todos,
            _ => return false,
        };

        info!(count = todos.len(), "folding legacy todo list into the activity collection");
        activities.extend(todos);
        renumber_conflicts(activities);
        true
    }
}

/// Reassign placeholder and colliding ids so the uniqueness invariant holds
/// after a migration merge.
fn renumber_conflicts(activities: &mut [Activity]) {
    let mut next = activities.iter().map(|a| a.id).max().unwrap_or(0).max(0) + 1;
    let mut seen = HashSet::new();
    for activity in activities.iter_mut() {
        if activity.id <= 0 || !seen.insert(activity.id) {
            activity.id = next;
            seen.insert(next);
            next += 1;
        }
    }
}
