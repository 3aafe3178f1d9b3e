use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::activity::Activity;
use crate::config::NOTIFICATION_TITLE;
use crate::error::{AppError, AppResult};

/// Opaque identifier the host hands back for one armed notification
pub type HostHandle = u64;

/// Host notification permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
}

/// Content of a scheduled notification. `id` is the join key that lets a
/// fired event be reconciled back to its activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationPayload {
    pub id: i64,
    pub title: String,
    pub body: String,
}

impl NotificationPayload {
    pub fn for_activity(activity: &Activity) -> Self {
        Self {
            id: activity.id,
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("It's time to: {}", activity.label),
        }
    }
}

/// A notification the host has delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredNotification {
    pub payload: NotificationPayload,
    pub fired_at: DateTime<Utc>,
}

/// The host notification service: permission handling, delayed delivery,
/// cancellation. Fired notifications arrive out of band on the channel the
/// host exposes at construction.
pub trait NotificationHost: Send {
    fn permission(&self) -> Permission;
    fn request_permission(&mut self) -> Permission;
    fn schedule_at(
        &mut self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> AppResult<HostHandle>;
    fn cancel(&mut self, handle: HostHandle);
}

/// Supersede-semantics wrapper around the notification host: at most one
/// pending notification per activity id, tracked in an id → handle map.
pub struct Scheduler {
    host: Box<dyn NotificationHost>,
    pending: HashMap<i64, HostHandle>,
}

impl Scheduler {
    pub fn new(host: Box<dyn NotificationHost>) -> Self {
        Self {
            host,
            pending: HashMap::new(),
        }
    }

    /// Arm (or re-arm) the reminder for an activity at its current due time.
    /// Any previously pending notification for the same id is cancelled
    /// first, never duplicated.
    pub fn schedule(&mut self, activity: &Activity) -> AppResult<()> {
        self.ensure_permission()?;

        if let Some(handle) = self.pending.remove(&activity.id) {
            self.host.cancel(handle);
        }

        let handle = self
            .host
            .schedule_at(activity.due_at, NotificationPayload::for_activity(activity))?;
        self.pending.insert(activity.id, handle);
        Ok(())
    }

    /// Cancel the pending notification for an id. Not finding one is fine;
    /// callers cancel defensively.
    pub fn cancel(&mut self, id: i64) {
        match self.pending.remove(&id) {
            Some(handle) => self.host.cancel(handle),
            None => debug!(id, "no pending notification to cancel"),
        }
    }

    pub fn has_pending(&self, id: i64) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn ensure_permission(&mut self) -> AppResult<()> {
        match self.host.permission() {
            Permission::Granted => Ok(()),
            Permission::Denied => Err(AppError::permission_denied("notifications are disabled")),
            Permission::Undetermined => match self.host.request_permission() {
                Permission::Granted => Ok(()),
                _ => Err(AppError::permission_denied(
                    "notification permission was not granted",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHost;
    use chrono::Duration;

    fn create_test_activity(id: i64) -> Activity {
        Activity::new(id, format!("Task {}", id), Utc::now() + Duration::hours(1))
    }

    #[test]
    fn test_schedule_arms_one_notification() {
        let host = MockHost::new();
        let mut scheduler = Scheduler::new(Box::new(host.clone()));

        scheduler.schedule(&create_test_activity(1)).unwrap();

        assert_eq!(host.armed_count(), 1);
        assert!(scheduler.has_pending(1));
        assert_eq!(host.armed_for(1).len(), 1);
    }

    #[test]
    fn test_reschedule_supersedes_instead_of_duplicating() {
        let host = MockHost::new();
        let mut scheduler = Scheduler::new(Box::new(host.clone()));

        let mut activity = create_test_activity(1);
        scheduler.schedule(&activity).unwrap();
        activity.due_at = activity.due_at + Duration::minutes(5);
        scheduler.schedule(&activity).unwrap();

        assert_eq!(host.schedule_calls(), 2);
        assert_eq!(host.armed_count(), 1);
        assert_eq!(host.armed_for(1), vec![activity.due_at]);
        assert_eq!(host.cancelled_count(), 1);
    }

    #[test]
    fn test_payload_carries_the_join_key() {
        let payload = NotificationPayload::for_activity(&create_test_activity(42));
        assert_eq!(payload.id, 42);
        assert_eq!(payload.body, "It's time to: Task 42");
    }

    #[test]
    fn test_cancel_unknown_id_is_soft() {
        let host = MockHost::new();
        let mut scheduler = Scheduler::new(Box::new(host.clone()));

        scheduler.cancel(99);
        assert_eq!(host.cancelled_count(), 0);
    }

    #[test]
    fn test_denied_permission_arms_nothing() {
        let host = MockHost::new();
        host.set_permission(Permission::Denied);
        let mut scheduler = Scheduler::new(Box::new(host.clone()));

        let result = scheduler.schedule(&create_test_activity(1));
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
        assert_eq!(host.armed_count(), 0);
        assert!(!scheduler.has_pending(1));
    }

    #[test]
    fn test_undetermined_permission_is_requested_first() {
        let host = MockHost::new();
        host.set_permission(Permission::Undetermined);
        let mut scheduler = Scheduler::new(Box::new(host.clone()));

        scheduler.schedule(&create_test_activity(1)).unwrap();
        assert_eq!(host.permission(), Permission::Granted);
        assert_eq!(host.armed_count(), 1);
    }

    #[test]
    fn test_host_failure_surfaces_as_scheduling_error() {
        let host = MockHost::new();
        host.set_fail_schedule(true);
        let mut scheduler = Scheduler::new(Box::new(host.clone()));

        let result = scheduler.schedule(&create_test_activity(1));
        assert!(matches!(result, Err(AppError::Scheduling(_))));
        assert!(!scheduler.has_pending(1));
    }
}
