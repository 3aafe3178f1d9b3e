//! Application configuration constants
//!
//! Centralized configuration for the reminder engine.

use chrono::Duration;

/// Storage key holding the unified activity collection
pub const ACTIVITIES_KEY: &str = "activities";

/// Storage key of the legacy standalone to-do list, folded into the
/// activity collection on first load
pub const TODOS_KEY: &str = "todos";

/// Storage key the pre-migration activity data is backed up under
pub const ACTIVITIES_BACKUP_KEY: &str = "activities_backup_v1";

/// Directory name under the platform-local data dir
pub const APP_DIR_NAME: &str = "ActivityReminder";

/// Default snooze delay in minutes
pub const SNOOZE_DELAY_MINUTES: i64 = 5;

/// Timer host polling interval in milliseconds
pub const HOST_TICK_MILLIS: u64 = 500;

/// Title line of every scheduled notification
pub const NOTIFICATION_TITLE: &str = "Activity Reminder";

/// The fixed snooze delay applied when a fired reminder is snoozed
pub fn snooze_delay() -> Duration {
    Duration::minutes(SNOOZE_DELAY_MINUTES)
}
