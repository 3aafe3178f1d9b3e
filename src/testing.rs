//! Shared test doubles for the storage and notification seams.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};
use crate::scheduler::{HostHandle, NotificationHost, NotificationPayload, Permission};
use crate::storage::KeyValue;

/// In-memory key-value backend. Clones share state so a test can keep a
/// handle after boxing the backend into `Storage`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn set_raw(&self, key: &str, value: &str) {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }
}

impl KeyValue for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(AppError::storage_write("simulated write failure"));
        }
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct MockHostState {
    next_handle: HostHandle,
    armed: Vec<(HostHandle, DateTime<Utc>, NotificationPayload)>,
    cancelled: Vec<HostHandle>,
    schedule_calls: usize,
}

/// Recording notification host. Clones share state; permission and schedule
/// failure are controllable mid-test. An undetermined permission is granted
/// on request unless the test says otherwise.
#[derive(Clone)]
pub struct MockHost {
    state: Arc<Mutex<MockHostState>>,
    permission: Arc<Mutex<Permission>>,
    fail_schedule: Arc<Mutex<bool>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockHostState::default())),
            permission: Arc::new(Mutex::new(Permission::Granted)),
            fail_schedule: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_permission(&self, permission: Permission) {
        *self.permission.lock().unwrap() = permission;
    }

    pub fn set_fail_schedule(&self, fail: bool) {
        *self.fail_schedule.lock().unwrap() = fail;
    }

    /// Due times currently armed for an activity id
    pub fn armed_for(&self, id: i64) -> Vec<DateTime<Utc>> {
        self.state
            .lock()
            .unwrap()
            .armed
            .iter()
            .filter(|(_, _, payload)| payload.id == id)
            .map(|(_, at, _)| *at)
            .collect()
    }

    pub fn armed_count(&self) -> usize {
        self.state.lock().unwrap().armed.len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.state.lock().unwrap().cancelled.len()
    }

    pub fn schedule_calls(&self) -> usize {
        self.state.lock().unwrap().schedule_calls
    }
}

impl NotificationHost for MockHost {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    fn request_permission(&mut self) -> Permission {
        let mut permission = self.permission.lock().unwrap();
        if *permission == Permission::Undetermined {
            *permission = Permission::Granted;
        }
        *permission
    }

    fn schedule_at(
        &mut self,
        at: DateTime<Utc>,
        payload: NotificationPayload,
    ) -> AppResult<HostHandle> {
        let mut state = self.state.lock().unwrap();
        state.schedule_calls += 1;
        if *self.fail_schedule.lock().unwrap() {
            return Err(AppError::scheduling("simulated host failure"));
        }
        state.next_handle += 1;
        let handle = state.next_handle;
        state.armed.push((handle, at, payload));
        Ok(handle)
    }

    fn cancel(&mut self, handle: HostHandle) {
        let mut state = self.state.lock().unwrap();
        state.armed.retain(|(h, _, _)| *h != handle);
        state.cancelled.push(handle);
    }
}
