//! Validation for externally supplied notification batches.
//!
//! Everything here runs before the store is touched, so a rejected batch
//! never leaves a partial write behind.

use serde_json::Value;

use crate::{
    db::models::{NotificationPayload, NotificationRecord},
    error::{Error, Result},
};

/// Parses a JSON batch into records, rejecting the whole batch on the first
/// malformed entry.
pub fn parse_batch(values: Vec<Value>) -> Result<Vec<NotificationRecord>> {
    if values.is_empty() {
        return Err(Error::validation("import batch is empty"));
    }

    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let payload: NotificationPayload = serde_json::from_value(value).map_err(|err| {
                Error::validation(format!("notification at index {index} is malformed: {err}"))
            })?;
            NotificationRecord::try_from(payload).map_err(|err| match err {
                Error::Validation(message) => {
                    Error::validation(format!("notification at index {index}: {message}"))
                }
                other => other,
            })
        })
        .collect()
}

/// Checks an already-typed batch.
pub fn validate_records(records: &[NotificationRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(Error::validation("import batch is empty"));
    }
    if let Some(index) = records.iter().position(|r| r.id.trim().is_empty()) {
        return Err(Error::validation(format!(
            "notification at index {index}: notification id is missing or empty"
        )));
    }
    Ok(())
}
