use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// One persisted reminder record.
///
/// `id` is the join key between the stored record and its pending
/// notification; it is minted once and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub label: String,
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(id: i64, label: String, due_at: DateTime<Utc>) -> Self {
        Self {
            id,
            label,
            due_at,
            done: false,
            created_at: Utc::now(),
        }
    }

    /// Whether the reminder time has passed for a still-pending activity.
    pub fn is_due(&self) -> bool {
        !self.done && self.due_at <= Utc::now()
    }
}

/// Normalize a user-supplied label, rejecting blank input.
pub(crate) fn validate_label(label: &str) -> AppResult<String> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("activity label must not be empty"));
    }
    Ok(trimmed.to_string())
}
