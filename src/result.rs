//! Uniform result records
//!
//! Every dispatch ends in exactly one [`DispatchResult`]: either the success
//! record of the sink/source, or a failure carrying a non-empty message with
//! the record left at its sentinel values.

use crate::error::DispatchError;
use serde::{Serialize, Serializer};

/// A per-sink/source record with a documented zero value
pub trait ResultRecord: Serialize {
    /// Record reported alongside a failure
    fn sentinel() -> Self;

    /// Record reported for a specific failure. Defaults to the sentinel.
    fn on_failure(_error: &DispatchError) -> Self
    where
        Self: Sized,
    {
        Self::sentinel()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult<T> {
    Success(T),
    Failure { msg: String, record: T },
}

impl<T: ResultRecord> DispatchResult<T> {
    /// Map a sink/source outcome into a result record
    pub fn from_result(result: Result<T, DispatchError>) -> Self {
        match result {
            Ok(record) => DispatchResult::Success(record),
            Err(error) => Self::from_error(&error),
        }
    }

    pub fn from_error(error: &DispatchError) -> Self {
        let mut msg = error.to_string();
        if msg.trim().is_empty() {
            msg = format!("{:?}", error);
        }
        DispatchResult::Failure {
            msg,
            record: T::on_failure(error),
        }
    }
}

impl<T> DispatchResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Success(_))
    }

    /// Process exit code for the host
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn record(&self) -> &T {
        match self {
            DispatchResult::Success(record) => record,
            DispatchResult::Failure { record, .. } => record,
        }
    }

    /// Failure message, `None` on success
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            DispatchResult::Success(_) => None,
            DispatchResult::Failure { msg, .. } => Some(msg),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    msg: Option<&'a str>,
    #[serde(flatten)]
    record: &'a T,
}

impl<T: Serialize> Serialize for DispatchResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = match self {
            DispatchResult::Success(record) => Envelope {
                changed: false,
                failed: None,
                msg: None,
                record,
            },
            DispatchResult::Failure { msg, record } => Envelope {
                changed: false,
                failed: Some(true),
                msg: Some(msg),
                record,
            },
        };
        envelope.serialize(serializer)
    }
}
