//! RDS SDK error classification
//!
//! Maps SDK failures onto [`RdsError`] using the service error code rather
//! than string matching on the rendered error.

use aws_sdk_rds::error::{DisplayErrorContext, ProvideErrorMetadata};
use odin_rds::RdsError;

/// Error codes meaning the referenced instance does not exist
const INSTANCE_NOT_FOUND_CODES: &[&str] = &["DBInstanceNotFound", "DBInstanceNotFoundFault"];

/// Error codes meaning the referenced snapshot does not exist
const SNAPSHOT_NOT_FOUND_CODES: &[&str] = &["DBSnapshotNotFound", "DBSnapshotNotFoundFault"];

const INSTANCE_EXISTS_CODES: &[&str] = &["DBInstanceAlreadyExists", "DBInstanceAlreadyExistsFault"];

const SNAPSHOT_EXISTS_CODES: &[&str] = &["DBSnapshotAlreadyExists", "DBSnapshotAlreadyExistsFault"];

/// Error codes meaning the instance is busy with another operation
const INVALID_STATE_CODES: &[&str] = &["InvalidDBInstanceState", "InvalidDBInstanceStateFault"];

/// Identifiers the failed call was about, used to fill in error messages
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorContext<'a> {
    pub instance: Option<&'a str>,
    pub snapshot: Option<&'a str>,
}

impl<'a> ErrorContext<'a> {
    pub fn instance(identifier: &'a str) -> Self {
        Self {
            instance: Some(identifier),
            snapshot: None,
        }
    }

    pub fn snapshot(mut self, identifier: &'a str) -> Self {
        self.snapshot = Some(identifier);
        self
    }
}

/// Classify an error by its service code.
///
/// `detail` is the full rendered error, kept for anything that falls
/// through to [`RdsError::Api`].
pub fn classify_code(code: Option<&str>, context: ErrorContext<'_>, detail: String) -> RdsError {
    let instance = context.instance.unwrap_or_default().to_string();
    let snapshot = context.snapshot.unwrap_or_default().to_string();

    match code {
        Some(c) if INSTANCE_NOT_FOUND_CODES.contains(&c) => RdsError::InstanceNotFound(instance),
        Some(c) if SNAPSHOT_NOT_FOUND_CODES.contains(&c) => RdsError::SnapshotNotFound(snapshot),
        Some(c) if INSTANCE_EXISTS_CODES.contains(&c) => RdsError::InstanceAlreadyExists(instance),
        Some(c) if SNAPSHOT_EXISTS_CODES.contains(&c) => RdsError::SnapshotAlreadyExists(snapshot),
        Some(c) if INVALID_STATE_CODES.contains(&c) => RdsError::InstanceNotAvailable(instance),
        _ => RdsError::Api(detail),
    }
}

/// Classify any SDK operation error
pub fn classify<E>(error: E, context: ErrorContext<'_>) -> RdsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let detail = DisplayErrorContext(&error).to_string();
    let code = error.code().map(str::to_string);
    tracing::debug!(code = ?code, error = %detail, "RDS call failed");
    classify_code(code.as_deref(), context, detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = classify_code(
            Some("DBInstanceNotFound"),
            ErrorContext::instance("test1"),
            String::new(),
        );
        assert_eq!(err, RdsError::InstanceNotFound("test1".to_string()));
        assert!(err.is_instance_not_found());

        let err = classify_code(
            Some("DBSnapshotNotFound"),
            ErrorContext::instance("test1").snapshot("snap"),
            String::new(),
        );
        assert_eq!(err.to_string(), "no such snapshot snap");
    }

    #[test]
    fn test_classify_conflicts() {
        let context = ErrorContext::instance("test1").snapshot("final");

        assert_eq!(
            classify_code(Some("DBInstanceAlreadyExists"), context, String::new()),
            RdsError::InstanceAlreadyExists("test1".to_string())
        );
        assert_eq!(
            classify_code(Some("DBSnapshotAlreadyExists"), context, String::new()),
            RdsError::SnapshotAlreadyExists("final".to_string())
        );
        assert_eq!(
            classify_code(Some("InvalidDBInstanceState"), context, String::new()),
            RdsError::InstanceNotAvailable("test1".to_string())
        );
    }

    #[test]
    fn test_classify_unknown_keeps_detail() {
        let err = classify_code(
            Some("Throttling"),
            ErrorContext::default(),
            "Rate exceeded".to_string(),
        );
        assert_eq!(err, RdsError::Api("Rate exceeded".to_string()));

        let err = classify_code(None, ErrorContext::default(), "dispatch failure".to_string());
        assert_eq!(err.to_string(), "RDS API error: dispatch failure");
    }
}
