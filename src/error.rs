//! Scheduler error taxonomy

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ItemId;
use crate::logging::Severity;
use crate::store::StoreError;

/// Machine-readable code attached to recoverable errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// An active group filter names a group no catalog item carries
    StaleActiveGroup,
    /// The device has no motion sensor
    DeviceMotionEvent,
}

/// Structured cause carried by stale-reference and environmental errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCause {
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ErrorCause {
    pub fn stale_active_group(group: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::StaleActiveGroup,
            value: Some(group.into()),
        }
    }

    pub fn device_motion() -> Self {
        Self {
            code: ErrorCode::DeviceMotionEvent,
            value: None,
        }
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{:?} ({})", self.code, value),
            None => write!(f, "{:?}", self.code),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Deck-level misconfiguration by the caller
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No term found: {0}")]
    TermNotFound(ItemId),

    /// The caller should drop the referenced value and retry
    #[error("Stale reference: {0}")]
    StaleReference(ErrorCause),

    /// A device capability is missing; the dependent feature is disabled
    #[error("Unsupported environment: {0}")]
    Environment(ErrorCause),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SchedulerError {
    pub fn cause(&self) -> Option<&ErrorCause> {
        match self {
            SchedulerError::StaleReference(cause) | SchedulerError::Environment(cause) => {
                Some(cause)
            }
            _ => None,
        }
    }

    /// Severity at which the error is reported on the error channel
    pub fn severity(&self) -> Severity {
        match self {
            SchedulerError::StaleReference(_) | SchedulerError::Environment(_) => Severity::Warn,
            SchedulerError::TermNotFound(_) => Severity::Warn,
            SchedulerError::Configuration(_) | SchedulerError::Store(_) => Severity::Error,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
