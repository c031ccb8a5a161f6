//! RDS orchestration error types

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the lifecycle core and by database providers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RdsError {
    #[error("Specify Master User")]
    MissingMasterUser,

    #[error("Specify Master User Password")]
    MissingMasterPassword,

    #[error("Specify size between {min} and {max}", min = crate::instance::MIN_SIZE_GB, max = crate::instance::MAX_SIZE_GB)]
    InvalidSize(i32),

    #[error("original instance name was empty")]
    MissingOriginalInstance,

    #[error("DB instance parameters failed to validate: {0}")]
    InvalidParameters(String),

    #[error("no snapshot found for {0} instance")]
    NoSnapshotFound(String),

    #[error("no such instance {0}")]
    InstanceNotFound(String),

    #[error("no such snapshot {0}")]
    SnapshotNotFound(String),

    #[error("instance {0} already exists")]
    InstanceAlreadyExists(String),

    #[error("snapshot {0} already exists")]
    SnapshotAlreadyExists(String),

    #[error("{0} instance state is not available")]
    InstanceNotAvailable(String),

    #[error("instance {0} has no endpoint")]
    MissingEndpoint(String),

    #[error("RDS API error: {0}")]
    Api(String),

    #[error("instance {identifier} reached terminal status '{status}'")]
    TerminalStatus { identifier: String, status: String },

    #[error("timed out after {waited:?} waiting for instance {identifier} to become '{target}'")]
    WaitTimeout {
        identifier: String,
        target: String,
        waited: Duration,
    },

    #[error("wait for instance {0} cancelled")]
    Cancelled(String),
}

/// Coarse classification of an [`RdsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any provider call
    Validation,
    /// Snapshot lookup found nothing to use
    Resolution,
    /// The provider refused the request or could not be reached
    Provider,
    /// The wait loop gave up
    Polling,
}

impl RdsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RdsError::MissingMasterUser
            | RdsError::MissingMasterPassword
            | RdsError::InvalidSize(_)
            | RdsError::MissingOriginalInstance => ErrorKind::Validation,
            RdsError::NoSnapshotFound(_) => ErrorKind::Resolution,
            RdsError::InvalidParameters(_)
            | RdsError::InstanceNotFound(_)
            | RdsError::SnapshotNotFound(_)
            | RdsError::InstanceAlreadyExists(_)
            | RdsError::SnapshotAlreadyExists(_)
            | RdsError::InstanceNotAvailable(_)
            | RdsError::MissingEndpoint(_)
            | RdsError::Api(_) => ErrorKind::Provider,
            RdsError::TerminalStatus { .. }
            | RdsError::WaitTimeout { .. }
            | RdsError::Cancelled(_) => ErrorKind::Polling,
        }
    }

    pub fn is_instance_not_found(&self) -> bool {
        matches!(self, RdsError::InstanceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, RdsError>;
