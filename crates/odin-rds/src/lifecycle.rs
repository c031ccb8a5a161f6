//! Lifecycle actions
//!
//! Every action is the same short pipeline: build the provider request from
//! an [`Instance`], submit it, wait for the expected status, then apply the
//! deferred modification if the action has one.
//!
//! | Action  | Submit                         | Waits for   | Afterwards            |
//! |---------|--------------------------------|-------------|-----------------------|
//! | create  | create_instance                | `available` | attach security groups|
//! | clone   | create_instance (from snapshot)| `available` | attach security groups|
//! | restore | restore_instance_from_snapshot | `available` | attach security groups|
//! | scale   | modify_instance                | `available` |                       |
//! | delete  | delete_instance                | `deleted`   |                       |

use crate::error::{RdsError, Result};
use crate::instance::Instance;
use crate::provider::{
    DatabaseProvider, DbInstance, DbSnapshot, ModifyInstanceRequest, STATUS_AVAILABLE,
    STATUS_DELETED,
};
use crate::snapshot;
use crate::waiter::{WaitConfig, Waiter};
use tokio_util::sync::CancellationToken;

/// Runs lifecycle actions against one provider
pub struct Lifecycle<'a, P: ?Sized> {
    provider: &'a P,
    wait: WaitConfig,
    cancel: Option<CancellationToken>,
}

impl<'a, P> Lifecycle<'a, P>
where
    P: DatabaseProvider + ?Sized,
{
    pub fn new(provider: &'a P, wait: WaitConfig) -> Self {
        Self {
            provider,
            wait,
            cancel: None,
        }
    }

    /// Abort any wait in progress once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Create an instance from scratch and return its endpoint address
    pub async fn create_instance(&self, instance: &Instance) -> Result<String> {
        let request = instance.create_db_input()?;
        tracing::info!(
            instance = %request.identifier,
            class = %request.class,
            size = request.allocated_storage,
            "Creating instance"
        );
        let created = self.provider.create_instance(&request).await?;
        self.finish_provisioning(instance, created).await
    }

    /// Create an instance seeded from the newest snapshot of
    /// `instance.original_instance_name` and return its endpoint address
    pub async fn clone_instance(&self, instance: &Instance) -> Result<String> {
        let request = instance.clone_db_input(self.provider).await?;
        tracing::info!(
            instance = %request.identifier,
            from = instance.original_instance().unwrap_or_default(),
            size = request.allocated_storage,
            "Cloning instance"
        );
        let created = self.provider.create_instance(&request).await?;
        self.finish_provisioning(instance, created).await
    }

    /// Restore the newest snapshot of `instance.original_instance_name` into
    /// a new instance and return its endpoint address
    pub async fn restore_instance(&self, instance: &Instance) -> Result<String> {
        let request = instance.restore_db_input(self.provider).await?;
        tracing::info!(
            instance = %request.identifier,
            snapshot = %request.snapshot_identifier,
            "Restoring instance"
        );
        let restored = self.provider.restore_instance_from_snapshot(&request).await?;
        self.finish_provisioning(instance, restored).await
    }

    /// Change the class of an existing instance.
    ///
    /// With `delay_change` the new class is queued for the next maintenance
    /// window, so the summary still names the current class.
    pub async fn scale_instance(&self, instance: &Instance, delay_change: bool) -> Result<String> {
        let request = ModifyInstanceRequest {
            identifier: instance.identifier.clone(),
            class: Some(instance.class.clone()).filter(|c| !c.is_empty()),
            security_groups: Vec::new(),
            apply_immediately: !delay_change,
        };
        request.validate()?;

        tracing::info!(
            instance = %request.identifier,
            class = %instance.class,
            delay_change,
            "Scaling instance"
        );
        let modified = self.provider.modify_instance(&request).await?;
        let scaled = self.waiter().wait_for_instance(modified, STATUS_AVAILABLE).await?;

        Ok(format!(
            "Instance {} is {}",
            scaled.identifier,
            scaled.class.as_deref().unwrap_or("unknown")
        ))
    }

    /// Delete an instance, taking a final snapshot when
    /// `instance.final_snapshot_id` is set
    pub async fn delete_instance(&self, instance: &Instance) -> Result<()> {
        let request = instance.delete_db_input()?;
        tracing::info!(
            instance = %request.identifier,
            final_snapshot = ?request.final_snapshot,
            "Deleting instance"
        );
        let deleting = self.provider.delete_instance(&request).await?;
        self.waiter().wait_for_instance(deleting, STATUS_DELETED).await?;

        tracing::info!(instance = %request.identifier, "Instance deleted");
        Ok(())
    }

    pub async fn create_snapshot(&self, instance_id: &str, snapshot_id: &str) -> Result<DbSnapshot> {
        snapshot::create_snapshot(self.provider, instance_id, snapshot_id).await
    }

    pub async fn list_snapshots(&self, instance_id: Option<&str>) -> Result<Vec<DbSnapshot>> {
        snapshot::list_snapshots(self.provider, instance_id).await
    }

    fn waiter(&self) -> Waiter<'a, P> {
        let waiter = Waiter::new(self.provider, self.wait.clone());
        match &self.cancel {
            Some(token) => waiter.with_cancellation(token.clone()),
            None => waiter,
        }
    }

    /// Wait for a new instance, then attach its security groups
    async fn finish_provisioning(&self, instance: &Instance, started: DbInstance) -> Result<String> {
        let ready = self.waiter().wait_for_instance(started, STATUS_AVAILABLE).await?;
        let address = ready
            .address()
            .map(str::to_string)
            .ok_or_else(|| RdsError::MissingEndpoint(ready.identifier.clone()))?;

        if instance.security_groups.is_empty() {
            tracing::debug!(instance = %instance.identifier, "No security groups to attach");
        } else {
            let request = instance.modify_db_input(false)?;
            tracing::info!(
                instance = %request.identifier,
                groups = ?request.security_groups,
                "Attaching security groups"
            );
            self.provider.modify_instance(&request).await?;
        }

        tracing::info!(instance = %ready.identifier, endpoint = %address, "Instance available");
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProvider;
    use crate::provider::{
        CreateInstanceRequest, CreateSnapshotRequest, DeleteInstanceRequest,
        RestoreInstanceRequest, STATUS_CREATING,
    };
    use async_trait::async_trait;

    /// Reports every instance as available but never hands out an endpoint
    struct NoEndpointProvider;

    #[async_trait]
    impl DatabaseProvider for NoEndpointProvider {
        fn name(&self) -> &str {
            "no-endpoint"
        }

        async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<DbInstance> {
            Ok(DbInstance::new(request.identifier.as_str(), STATUS_CREATING))
        }

        async fn describe_instance(&self, identifier: &str) -> Result<DbInstance> {
            Ok(DbInstance::new(identifier, STATUS_AVAILABLE))
        }

        async fn modify_instance(&self, request: &ModifyInstanceRequest) -> Result<DbInstance> {
            Ok(DbInstance::new(request.identifier.as_str(), STATUS_AVAILABLE))
        }

        async fn delete_instance(&self, request: &DeleteInstanceRequest) -> Result<DbInstance> {
            Err(RdsError::InstanceNotFound(request.identifier.clone()))
        }

        async fn restore_instance_from_snapshot(
            &self,
            request: &RestoreInstanceRequest,
        ) -> Result<DbInstance> {
            Ok(DbInstance::new(request.identifier.as_str(), STATUS_CREATING))
        }

        async fn create_snapshot(&self, request: &CreateSnapshotRequest) -> Result<DbSnapshot> {
            Err(RdsError::InstanceNotFound(request.instance_identifier.clone()))
        }

        async fn describe_snapshots(
            &self,
            _instance_identifier: Option<&str>,
        ) -> Result<Vec<DbSnapshot>> {
            Ok(Vec::new())
        }
    }

    fn lifecycle(provider: &InMemoryProvider) -> Lifecycle<'_, InMemoryProvider> {
        Lifecycle::new(provider, WaitConfig::immediate())
    }

    #[tokio::test]
    async fn test_create_attaches_security_groups() {
        let provider = InMemoryProvider::new();
        let instance = Instance::new("test1")
            .with_class("db.m1.small")
            .with_credentials("master", "master")
            .with_size(5)
            .with_security_groups(["sg-1", "sg-2"]);

        let endpoint = lifecycle(&provider).create_instance(&instance).await.unwrap();
        assert_eq!(endpoint, "test1.0.us-east-1.rds.amazonaws.com");

        let stored = provider.instance("test1").unwrap();
        assert_eq!(stored.security_groups, vec!["sg-1", "sg-2"]);
        assert_eq!(stored.class.as_deref(), Some("db.m1.small"));
    }

    #[tokio::test]
    async fn test_create_invalid_makes_no_provider_call() {
        let provider = InMemoryProvider::new();
        let instance = Instance::new("test1")
            .with_class("db.m1.small")
            .with_credentials("master", "master")
            .with_size(6145);

        let err = lifecycle(&provider).create_instance(&instance).await.unwrap_err();
        assert_eq!(err.to_string(), "Specify size between 5 and 6144");
        assert!(provider.instance("test1").is_none());
    }

    #[tokio::test]
    async fn test_create_without_endpoint() {
        let provider = NoEndpointProvider;
        let instance = Instance::new("test1")
            .with_class("db.m1.small")
            .with_credentials("master", "master")
            .with_size(5)
            .with_security_groups(["sg-1"]);

        let err = Lifecycle::new(&provider, WaitConfig::immediate())
            .create_instance(&instance)
            .await
            .unwrap_err();
        assert_eq!(err, RdsError::MissingEndpoint("test1".to_string()));
        assert_eq!(err.to_string(), "instance test1 has no endpoint");
    }

    #[tokio::test]
    async fn test_scale_missing_instance() {
        let provider = InMemoryProvider::new();
        let instance = Instance::new("test1").with_class("db.m1.small");

        let err = lifecycle(&provider)
            .scale_instance(&instance, false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no such instance test1");
    }

    #[tokio::test]
    async fn test_delete_missing_instance() {
        let provider = InMemoryProvider::new();

        let err = lifecycle(&provider)
            .delete_instance(&Instance::new("test2"))
            .await
            .unwrap_err();
        assert_eq!(err, RdsError::InstanceNotFound("test2".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_before_wait() {
        let provider = InMemoryProvider::new();
        let token = CancellationToken::new();
        token.cancel();
        let instance = Instance::new("test1")
            .with_class("db.m1.small")
            .with_credentials("master", "master")
            .with_size(5);

        let err = Lifecycle::new(&provider, WaitConfig::immediate())
            .with_cancellation(token)
            .create_instance(&instance)
            .await
            .unwrap_err();
        assert_eq!(err, RdsError::Cancelled("test1".to_string()));
        // The create call itself went through
        assert!(provider.instance("test1").is_some());
    }
}
