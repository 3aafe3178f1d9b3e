use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::warn;

use crate::config::snooze_delay;
use crate::controller::Controller;
use crate::error::AppError;
use crate::scheduler::FiredNotification;

/// The two choices offered when a reminder fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Snooze,
    Done,
}

/// UI collaborator that asks the user what to do with a fired reminder
pub trait ReminderPrompt: Send + Sync {
    fn choose(&self, fired: &FiredNotification) -> PromptChoice;
}

/// What became of one fired notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Routed(PromptChoice),
    /// The activity was deleted after its notification was armed; a
    /// legitimate race, dismissed quietly rather than failed loudly
    Stale,
    Failed(AppError),
}

/// Join a fired notification back to its activity and route the user's
/// choice into the lifecycle controller.
pub fn handle_fired(
    controller: &Controller,
    prompt: &dyn ReminderPrompt,
    fired: &FiredNotification,
) -> EventOutcome {
    let id = fired.payload.id;

    if controller.get(id).is_none() {
        warn!(id, "stale reminder fired for a deleted activity");
        return EventOutcome::Stale;
    }

    let choice = prompt.choose(fired);
    let result = match choice {
        PromptChoice::Snooze => controller.snooze(id, snooze_delay()).map(|_| ()),
        PromptChoice::Done => controller.mark_done(id),
    };

    match result {
        Ok(()) => EventOutcome::Routed(choice),
        // The prompt happens outside the controller lock, so a delete can
        // still win the race after the lookup above
        Err(AppError::NotFound(_)) => {
            warn!(id, "activity disappeared while its reminder was being handled");
            EventOutcome::Stale
        }
        Err(e) => {
            warn!(id, "failed to apply reminder choice: {}", e);
            EventOutcome::Failed(e)
        }
    }
}

/// Consume the host's fired-notification subscription on a background
/// thread until the host side hangs up.
pub fn spawn_event_loop(
    controller: Arc<Controller>,
    fired: Receiver<FiredNotification>,
    prompt: Arc<dyn ReminderPrompt>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for notification in fired {
            handle_fired(&controller, prompt.as_ref(), &notification);
        }
    })
}
