use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::activity::Activity;

/// Activity record shape from older app versions, kept for migration
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyActivity {
    pub id: String,
    pub activity: String,
    pub time: String,
    #[serde(default)]
    pub done: bool,
}

/// Entry shape of the standalone to-do list older app versions kept
/// under its own storage key
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyTodo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}

fn migrate_legacy_activity(legacy: LegacyActivity) -> Activity {
    let due_at = DateTime::parse_from_rfc3339(&legacy.time)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Activity {
        // Legacy ids were millisecond-epoch strings; unparseable ones are
        // renumbered by the caller.
        id: legacy.id.parse().unwrap_or(0),
        label: legacy.activity,
        due_at,
        done: legacy.done,
        created_at: Utc::now(),
    }
}

/// Try to parse content as the legacy activity format and migrate if so.
///
/// Returns `None` when the content is not legacy-shaped; the caller decides
/// whether that means current-format data or corruption.
pub fn try_migrate_legacy_activities(content: &str) -> Option<Vec<Activity>> {
    let legacy: Vec<LegacyActivity> = serde_json::from_str(content).ok()?;
    Some(legacy.into_iter().map(migrate_legacy_activity).collect())
}

/// Try to parse content as the legacy standalone to-do list.
///
/// The legacy list never carried a due time, so migrated entries come out
/// due immediately.
pub fn try_migrate_legacy_todos(content: &str) -> Option<Vec<Activity>> {
    let legacy: Vec<LegacyTodo> = serde_json::from_str(content).ok()?;
    let now = Utc::now();
    Some(
        legacy
            .into_iter()
            .map(|todo| Activity {
                id: todo.id.parse().unwrap_or(0),
                label: todo.text,
                due_at: now,
                done: todo.done,
                created_at: now,
            })
            .collect(),
    )
}
