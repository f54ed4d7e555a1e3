use thiserror::Error;

/// Failures at the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("a schedule for mosque {mosque_id} on {date} already exists")]
    Conflict { mosque_id: String, date: String },

    #[error("no {entity} matches {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("stored {column} is malformed: {reason}")]
    Decode { column: String, reason: String },

    #[error("could not encode {column}: {reason}")]
    Encode { column: String, reason: String },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn schedule_not_found(mosque_id: &str, date: &str) -> Self {
        StoreError::NotFound {
            entity: "schedule",
            key: format!("{}/{}", mosque_id, date),
        }
    }
}

/// Draft fields rejected by strict validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: String },

    #[error("{field}: '{value}' is not a 24-hour HH:MM time")]
    BadTime { field: String, value: String },

    #[error("{prayer}: iqamah {iqamah} is before adhan {adhan}")]
    IqamahBeforeAdhan {
        prayer: String,
        adhan: String,
        iqamah: String,
    },

    #[error("'{0}' is not a calendar date (expected YYYY-MM-DD)")]
    BadDate(String),
}

/// Errors surfaced by the schedule manager to its caller.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },

    #[error("a schedule already exists for this date")]
    ScheduleExists,

    #[error("no prayer times found for previous day ({0})")]
    PreviousDayMissing(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
