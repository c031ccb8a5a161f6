//! Instance status polling
//!
//! RDS is eventually consistent: every lifecycle call returns immediately
//! and the instance walks through provider-defined statuses on its own.
//! [`Waiter`] re-describes the instance at a fixed interval until it reports
//! the requested status, a terminal failure status, the timeout elapses, or
//! the caller cancels.

use crate::error::{RdsError, Result};
use crate::provider::{DatabaseProvider, DbInstance, STATUS_DELETED};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Statuses from which an instance never reaches `available` on its own
pub const DEFAULT_FAILURE_STATUSES: &[&str] = &[
    "failed",
    "incompatible-parameters",
    "incompatible-restore",
    "incompatible-network",
    "incompatible-option-group",
    "incompatible-parameter-group",
    "inaccessible-encryption-credentials",
    "restore-error",
];

/// Polling configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between two describe calls
    pub poll_interval: Duration,

    /// Give up after this long; `None` waits forever
    pub timeout: Option<Duration>,

    /// Statuses that end the wait with an error
    pub failure_statuses: Vec<String>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Some(Duration::from_secs(2 * 60 * 60)),
            failure_statuses: DEFAULT_FAILURE_STATUSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl WaitConfig {
    /// No delay between polls and no timeout
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            timeout: None,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_failure(&self, status: &str) -> bool {
        self.failure_statuses.iter().any(|s| s == status)
    }
}

/// Blocks until an instance reaches a target status
pub struct Waiter<'a, P: ?Sized> {
    provider: &'a P,
    config: WaitConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, P> Waiter<'a, P>
where
    P: DatabaseProvider + ?Sized,
{
    pub fn new(provider: &'a P, config: WaitConfig) -> Self {
        Self {
            provider,
            config,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Poll until `instance` reports `target` and return its final state.
    ///
    /// Waiting for [`STATUS_DELETED`] also succeeds once the provider stops
    /// knowing the instance.
    pub async fn wait_for_instance(&self, instance: DbInstance, target: &str) -> Result<DbInstance> {
        let start = Instant::now();
        let identifier = instance.identifier.clone();
        let mut current = instance;
        let mut attempts = 0u32;

        loop {
            if current.status == target {
                tracing::debug!(instance = %identifier, status = target, attempts, "Instance reached status");
                return Ok(current);
            }

            if self.config.is_failure(&current.status) {
                tracing::warn!(instance = %identifier, status = %current.status, "Instance reached terminal status");
                return Err(RdsError::TerminalStatus {
                    identifier,
                    status: current.status,
                });
            }

            if let Some(timeout) = self.config.timeout {
                let waited = start.elapsed();
                if waited >= timeout {
                    return Err(RdsError::WaitTimeout {
                        identifier,
                        target: target.to_string(),
                        waited,
                    });
                }
            }

            if self.is_cancelled() {
                return Err(RdsError::Cancelled(identifier));
            }

            attempts += 1;
            current = match self.provider.describe_instance(&identifier).await {
                Ok(described) => described,
                Err(e) if e.is_instance_not_found() && target == STATUS_DELETED => {
                    tracing::debug!(instance = %identifier, attempts, "Instance is gone");
                    return Ok(current.with_status(STATUS_DELETED));
                }
                Err(e) => return Err(e),
            };

            tracing::debug!(
                instance = %identifier,
                status = %current.status,
                target,
                attempt = attempts,
                "Polled instance status"
            );

            // Target and failure statuses are reported at the top of the loop
            if current.status != target && !self.config.is_failure(&current.status) {
                self.pause(&identifier, start).await?;
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Sleep one poll interval, cut short at the timeout
    async fn pause(&self, identifier: &str, start: Instant) -> Result<()> {
        let delay = match self.config.timeout {
            Some(timeout) => self
                .config
                .poll_interval
                .min(timeout.saturating_sub(start.elapsed())),
            None => self.config.poll_interval,
        };

        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = sleep(delay) => Ok(()),
                    _ = token.cancelled() => Err(RdsError::Cancelled(identifier.to_string())),
                }
            }
            None => {
                sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProvider;
    use crate::provider::{STATUS_AVAILABLE, STATUS_CREATING, STATUS_DELETING};

    #[tokio::test]
    async fn test_wait_until_available() {
        let provider =
            InMemoryProvider::new().with_instances(vec![DbInstance::new("test1", STATUS_CREATING)]);
        let waiter = Waiter::new(&provider, WaitConfig::immediate());

        let start = provider.instance("test1").unwrap();
        let instance = waiter
            .wait_for_instance(start, STATUS_AVAILABLE)
            .await
            .unwrap();
        assert!(instance.is_available());
        assert_eq!(
            instance.address(),
            Some("test1.0.us-east-1.rds.amazonaws.com")
        );
    }

    #[tokio::test]
    async fn test_already_at_target_does_not_poll() {
        // Unknown to the provider, so any describe call would fail
        let provider = InMemoryProvider::new();
        let waiter = Waiter::new(&provider, WaitConfig::immediate());

        let instance = waiter
            .wait_for_instance(DbInstance::new("ghost", STATUS_AVAILABLE), STATUS_AVAILABLE)
            .await
            .unwrap();
        assert_eq!(instance.identifier, "ghost");
    }

    #[tokio::test]
    async fn test_describe_error_aborts() {
        let provider = InMemoryProvider::new();
        let waiter = Waiter::new(&provider, WaitConfig::immediate());

        let err = waiter
            .wait_for_instance(DbInstance::new("ghost", STATUS_CREATING), STATUS_AVAILABLE)
            .await
            .unwrap_err();
        assert_eq!(err, RdsError::InstanceNotFound("ghost".to_string()));
    }

    #[tokio::test]
    async fn test_wait_for_deleted() {
        let provider =
            InMemoryProvider::new().with_instances(vec![DbInstance::new("test1", STATUS_DELETING)]);
        let waiter = Waiter::new(&provider, WaitConfig::immediate());

        let instance = waiter
            .wait_for_instance(DbInstance::new("test1", STATUS_DELETING), STATUS_DELETED)
            .await
            .unwrap();
        assert_eq!(instance.status, STATUS_DELETED);
        assert!(provider.instance("test1").is_none());
    }

    #[tokio::test]
    async fn test_terminal_status() {
        let provider =
            InMemoryProvider::new().with_instances(vec![DbInstance::new("test1", "failed")]);
        let waiter = Waiter::new(&provider, WaitConfig::immediate());

        let err = waiter
            .wait_for_instance(DbInstance::new("test1", STATUS_CREATING), STATUS_AVAILABLE)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RdsError::TerminalStatus {
                identifier: "test1".to_string(),
                status: "failed".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let provider = InMemoryProvider::new()
            .with_instances(vec![DbInstance::new("test1", "storage-optimization")]);
        let config = WaitConfig::default()
            .with_poll_interval(Duration::from_secs(5))
            .with_timeout(Some(Duration::from_secs(60)));
        let waiter = Waiter::new(&provider, config);

        let err = waiter
            .wait_for_instance(DbInstance::new("test1", STATUS_CREATING), STATUS_AVAILABLE)
            .await
            .unwrap_err();
        match err {
            RdsError::WaitTimeout { identifier, target, waited } => {
                assert_eq!(identifier, "test1");
                assert_eq!(target, STATUS_AVAILABLE);
                assert!(waited >= Duration::from_secs(60));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_shorter_than_poll_interval() {
        let provider = InMemoryProvider::new()
            .with_instances(vec![DbInstance::new("test1", "storage-optimization")]);
        let config = WaitConfig::default()
            .with_poll_interval(Duration::from_secs(300))
            .with_timeout(Some(Duration::from_secs(60)));
        let waiter = Waiter::new(&provider, config);

        let err = waiter
            .wait_for_instance(DbInstance::new("test1", STATUS_CREATING), STATUS_AVAILABLE)
            .await
            .unwrap_err();
        match err {
            RdsError::WaitTimeout { waited, .. } => {
                assert!(waited >= Duration::from_secs(60));
                assert!(waited < Duration::from_secs(61), "waited {waited:?}");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_status_reported_without_pause() {
        let provider =
            InMemoryProvider::new().with_instances(vec![DbInstance::new("test1", "failed")]);
        let config = WaitConfig::default().with_poll_interval(Duration::from_secs(5));
        let waiter = Waiter::new(&provider, config);

        let start = Instant::now();
        let err = waiter
            .wait_for_instance(DbInstance::new("test1", STATUS_CREATING), STATUS_AVAILABLE)
            .await
            .unwrap_err();
        assert!(matches!(err, RdsError::TerminalStatus { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let provider = InMemoryProvider::new()
            .with_instances(vec![DbInstance::new("test1", "storage-optimization")]);
        let token = CancellationToken::new();
        let waiter = Waiter::new(&provider, WaitConfig::default().with_timeout(None))
            .with_cancellation(token.clone());

        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_secs(30)).await;
            canceller.cancel();
        });

        let err = waiter
            .wait_for_instance(DbInstance::new("test1", STATUS_CREATING), STATUS_AVAILABLE)
            .await
            .unwrap_err();
        assert_eq!(err, RdsError::Cancelled("test1".to_string()));
    }

    #[test]
    fn test_default_config() {
        let config = WaitConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(config.is_failure("incompatible-parameters"));
        assert!(!config.is_failure("creating"));
    }
}
