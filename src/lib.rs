//! Activity reminder engine.
//!
//! A persisted list of scheduled activities bound to local notifications:
//! the [`Controller`] owns the collection and keeps exactly one pending
//! notification armed per open activity (none once done), persisting first
//! and reconciling notifications second on every operation. Storage and the
//! notification service are collaborator traits ([`KeyValue`],
//! [`NotificationHost`]); [`FileStore`] and [`TimerHost`] are the built-in
//! local implementations, and [`handle_fired`]/[`spawn_event_loop`] route
//! fired notifications back into the lifecycle as Snooze or Done.

mod activity;
pub mod config;
mod controller;
mod error;
mod events;
mod host;
mod scheduler;
mod storage;
#[cfg(test)]
pub(crate) mod testing;

pub use activity::Activity;
pub use controller::{AddOutcome, Controller, ReminderStatus, SnoozeOutcome, UpdateOutcome};
pub use error::{AppError, AppResult};
pub use events::{handle_fired, spawn_event_loop, EventOutcome, PromptChoice, ReminderPrompt};
pub use host::TimerHost;
pub use scheduler::{
    FiredNotification, HostHandle, NotificationHost, NotificationPayload, Permission, Scheduler,
};
pub use storage::{FileStore, KeyValue, Storage};
