//! The reported outcome of one search step

use crate::error::Result;
use crate::mail::Mail;
use serde::Serialize;
use std::time::Duration;

/// Outcome of one invocation.
///
/// `err` is empty on success; on failure it holds the error text and
/// `subject`/`body` stay empty. `time_seconds` is recorded either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub err: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(rename = "timeseconds", skip_serializing_if = "is_zero")]
    pub time_seconds: f64,
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::float_cmp)]
fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

impl SearchResult {
    /// Fold a search outcome and its duration into a result.
    #[must_use]
    pub fn from_outcome(outcome: Result<Mail>, elapsed: Duration) -> Self {
        let mut result = match outcome {
            Ok(mail) => Self {
                subject: mail.subject,
                body: mail.body,
                ..Self::default()
            },
            Err(e) => Self {
                err: e.to_string(),
                ..Self::default()
            },
        };
        result.time_seconds = elapsed.as_secs_f64();
        result
    }

    /// The default pass criterion: no error text.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.err.is_empty()
    }
}
