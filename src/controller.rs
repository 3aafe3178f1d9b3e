use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::activity::{validate_label, Activity};
use crate::error::{AppError, AppResult};
use crate::host::TimerHost;
use crate::scheduler::{FiredNotification, NotificationHost, Scheduler};
use crate::storage::Storage;

/// How the reminder half of an operation went. The durable record always
/// takes priority over the best-effort reminder, so a failed arm is
/// reported here instead of undoing the persisted change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderStatus {
    Armed,
    NotArmed(AppError),
}

#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub id: i64,
    pub reminder: ReminderStatus,
}

#[derive(Debug, Clone)]
pub struct SnoozeOutcome {
    pub due_at: DateTime<Utc>,
    pub reminder: ReminderStatus,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub due_at: DateTime<Utc>,
    /// `None` for a done activity, which carries no reminder to re-arm
    pub reminder: Option<ReminderStatus>,
}

struct Inner {
    activities: Vec<Activity>,
    storage: Storage,
    scheduler: Scheduler,
    degraded: bool,
}

/// Reminder lifecycle controller.
///
/// Owns the activity collection and keeps it converged with the set of
/// pending notifications: after every operation each non-done activity has
/// exactly one notification armed at its current due time and each done
/// activity has none. Every operation takes the one lock around
/// read → mutate → persist → reconcile, so the host's fired-notification
/// thread and UI calls serialize cleanly against each other.
pub struct Controller {
    inner: Mutex<Inner>,
}

impl Controller {
    /// Load the persisted collection and arm reminders for everything still
    /// pending. An unreadable collection degrades to an empty in-memory
    /// session rather than failing startup.
    pub fn open(mut storage: Storage, host: Box<dyn NotificationHost>) -> Self {
        let mut degraded = false;
        let activities = match storage.load() {
            Ok(activities) => activities,
            Err(e) => {
                warn!("failed to load activities, starting with an empty list: {}", e);
                degraded = true;
                Vec::new()
            }
        };

        let mut scheduler = Scheduler::new(host);
        for activity in activities.iter().filter(|a| !a.done) {
            if let Err(e) = scheduler.schedule(activity) {
                warn!(id = activity.id, "failed to arm reminder on startup: {}", e);
            }
        }

        Self {
            inner: Mutex::new(Inner {
                activities,
                storage,
                scheduler,
                degraded,
            }),
        }
    }

    /// Controller over default on-disk storage and the in-process timer
    /// host, returning the fired-notification subscription alongside it.
    pub fn open_default() -> AppResult<(Self, Receiver<FiredNotification>)> {
        let storage = Storage::open_default()?;
        let (host, fired) = TimerHost::spawn();
        Ok((Self::open(storage, Box::new(host)), fired))
    }

    /// Create a new pending activity and arm its reminder.
    pub fn add(&self, label: &str, due_at: DateTime<Utc>) -> AppResult<AddOutcome> {
        let label = validate_label(label)?;
        let mut inner = self.lock();

        let id = inner.next_id();
        let activity = Activity::new(id, label, due_at);
        inner.activities.push(activity.clone());

        let saved = inner.persist();
        let reminder = inner.arm(&activity);
        info!(id, "activity added");

        saved?;
        Ok(AddOutcome { id, reminder })
    }

    /// Rewrite an activity's label and due time, superseding its pending
    /// notification when it is still open.
    pub fn update(&self, id: i64, label: &str, due_at: DateTime<Utc>) -> AppResult<UpdateOutcome> {
        let label = validate_label(label)?;
        let mut inner = self.lock();

        let pos = inner.find(id).ok_or_else(|| no_activity(id))?;
        inner.activities[pos].label = label;
        inner.activities[pos].due_at = due_at;
        let activity = inner.activities[pos].clone();

        let saved = inner.persist();
        let reminder = if activity.done {
            None
        } else {
            Some(inner.arm(&activity))
        };

        saved?;
        Ok(UpdateOutcome {
            due_at: activity.due_at,
            reminder,
        })
    }

    /// Remove an activity. The persisted removal is never blocked by a
    /// notification cancellation problem; cancellation is defensive.
    pub fn delete(&self, id: i64) -> AppResult<()> {
        let mut inner = self.lock();

        let pos = inner.find(id).ok_or_else(|| no_activity(id))?;
        inner.activities.remove(pos);

        let saved = inner.persist();
        inner.scheduler.cancel(id);
        info!(id, "activity deleted");

        saved
    }

    /// Transition an activity to done and disarm its reminder. Marking an
    /// already-done activity again is an Ok no-op.
    pub fn mark_done(&self, id: i64) -> AppResult<()> {
        let mut inner = self.lock();

        let pos = inner.find(id).ok_or_else(|| no_activity(id))?;
        if inner.activities[pos].done {
            return Ok(());
        }
        inner.activities[pos].done = true;

        let saved = inner.persist();
        inner.scheduler.cancel(id);
        info!(id, "activity marked done");

        saved
    }

    /// Extension transition: bring a done activity back to pending and
    /// re-arm its reminder.
    pub fn reopen(&self, id: i64) -> AppResult<ReminderStatus> {
        let mut inner = self.lock();

        let pos = inner.find(id).ok_or_else(|| no_activity(id))?;
        if !inner.activities[pos].done {
            return Err(AppError::not_found(format!("activity {id} is not done")));
        }
        inner.activities[pos].done = false;
        let activity = inner.activities[pos].clone();

        let saved = inner.persist();
        let reminder = inner.arm(&activity);
        info!(id, "activity reopened");

        saved?;
        Ok(reminder)
    }

    /// Push an activity's due time out by `delay` and re-arm its reminder,
    /// superseding the previous one. Snoozes are additive: snoozing twice
    /// moves the due time out twice.
    pub fn snooze(&self, id: i64, delay: Duration) -> AppResult<SnoozeOutcome> {
        if delay <= Duration::zero() {
            return Err(AppError::validation("snooze delay must be positive"));
        }
        let mut inner = self.lock();

        let pos = inner.find(id).ok_or_else(|| no_activity(id))?;
        if inner.activities[pos].done {
            return Err(AppError::not_found(format!("activity {id} is already done")));
        }
        inner.activities[pos].due_at = inner.activities[pos].due_at + delay;
        let activity = inner.activities[pos].clone();

        let saved = inner.persist();
        let reminder = inner.arm(&activity);
        info!(id, due_at = %activity.due_at, "activity snoozed");

        saved?;
        Ok(SnoozeOutcome {
            due_at: activity.due_at,
            reminder,
        })
    }

    /// Read-only projection of the whole collection, soonest due first.
    pub fn activities(&self) -> Vec<Activity> {
        let inner = self.lock();
        let mut activities = inner.activities.clone();
        activities.sort_by_key(|a| a.due_at);
        activities
    }

    /// Open activities, soonest due first.
    pub fn pending(&self) -> Vec<Activity> {
        self.activities().into_iter().filter(|a| !a.done).collect()
    }

    /// Done activities, soonest due first.
    pub fn completed(&self) -> Vec<Activity> {
        self.activities().into_iter().filter(|a| a.done).collect()
    }

    pub fn get(&self, id: i64) -> Option<Activity> {
        self.lock().activities.iter().find(|a| a.id == id).cloned()
    }

    /// True while the session is running on in-memory state because the
    /// last storage access failed; clears when a save goes through again.
    pub fn is_degraded(&self) -> bool {
        self.lock().degraded
    }

    /// Lock controller state, recovering from poison if needed
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn no_activity(id: i64) -> AppError {
    AppError::not_found(format!("no activity with id {id}"))
}

impl Inner {
    fn next_id(&self) -> i64 {
        self.activities.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    fn find(&self, id: i64) -> Option<usize> {
        self.activities.iter().position(|a| a.id == id)
    }

    /// Persist the collection. On failure the in-memory mutation stands and
    /// the session is flagged degraded until a save succeeds again.
    fn persist(&mut self) -> AppResult<()> {
        match self.storage.save(&self.activities) {
            Ok(()) => {
                self.degraded = false;
                Ok(())
            }
            Err(e) => {
                warn!("failed to persist activities, continuing in memory: {}", e);
                self.degraded = true;
                Err(e)
            }
        }
    }

    fn arm(&mut self, activity: &Activity) -> ReminderStatus {
        match self.scheduler.schedule(activity) {
            Ok(()) => ReminderStatus::Armed,
            Err(e) => {
                warn!(id = activity.id, "reminder not armed: {}", e);
                ReminderStatus::NotArmed(e)
            }
        }
    }
}
