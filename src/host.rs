use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::HOST_TICK_MILLIS;
use crate::error::{AppError, AppResult};
use crate::scheduler::{
    FiredNotification, HostHandle, NotificationHost, NotificationPayload, Permission,
};

enum Control {
    Schedule {
        handle: HostHandle,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    },
    Cancel {
        handle: HostHandle,
    },
    Shutdown,
}

/// In-process notification host.
///
/// A timer thread keeps a due-sorted queue of armed notifications and
/// delivers each over the fired-notification channel once its time passes.
/// Permission is always granted; this host stands in for a platform
/// notification service when the engine runs headless.
pub struct TimerHost {
    control: Sender<Control>,
    next_handle: HostHandle,
    worker: Option<JoinHandle<()>>,
}

impl TimerHost {
    /// Start the timer thread. The receiver is the fired-notification
    /// subscription consumed by the event handler.
    pub fn spawn() -> (Self, Receiver<FiredNotification>) {
        let (control_tx, control_rx) = mpsc::channel();
        let (fired_tx, fired_rx) = mpsc::channel();

        let worker = thread::spawn(move || run(control_rx, fired_tx));

        let host = Self {
            control: control_tx,
            next_handle: 0,
            worker: Some(worker),
        };
        (host, fired_rx)
    }
}

impl NotificationHost for TimerHost {
    fn permission(&self) -> Permission {
        Permission::Granted
    }

    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn schedule_at(
        &mut self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> AppResult<HostHandle> {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.control
            .send(Control::Schedule { handle, at, payload })
            .map_err(|_| AppError::scheduling("timer thread is not running"))?;
        Ok(handle)
    }

    fn cancel(&mut self, handle: HostHandle) {
        let _ = self.control.send(Control::Cancel { handle });
    }
}

impl Drop for TimerHost {
    fn drop(&mut self) {
        let _ = self.control.send(Control::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(control: Receiver<Control>, fired: Sender<FiredNotification>) {
    let mut armed: Vec<(HostHandle, DateTime<Utc>, NotificationPayload)> = Vec::new();

    loop {
        match control.recv_timeout(Duration::from_millis(HOST_TICK_MILLIS)) {
            Ok(Control::Schedule { handle, at, payload }) => {
                armed.push((handle, at, payload));
                armed.sort_by_key(|(_, at, _)| *at);
            }
            Ok(Control::Cancel { handle }) => {
                armed.retain(|(h, _, _)| *h != handle);
            }
            Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        let now = Utc::now();
        while armed.first().map_or(false, |(_, at, _)| *at <= now) {
            let (handle, _, payload) = armed.remove(0);
            debug!(handle, id = payload.id, "notification fired");
            if fired
                .send(FiredNotification {
                    payload,
                    fired_at: now,
                })
                .is_err()
            {
                // Subscriber hung up; nothing left to deliver to
                return;
            }
        }
    }
}
