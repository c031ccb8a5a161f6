//! AWS RDS provider implementation

use crate::error::{ErrorContext, classify};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_rds::Client;
use aws_sdk_rds::types;
use chrono::{DateTime, Utc};
use odin_rds::provider::{
    CreateInstanceRequest, CreateSnapshotRequest, DatabaseProvider, DbInstance, DbSnapshot,
    DeleteInstanceRequest, Endpoint, FinalSnapshot, ModifyInstanceRequest,
    RestoreInstanceRequest,
};
use odin_rds::{RdsError, Result};

/// Status reported when the SDK omits one
const UNKNOWN_STATUS: &str = "unknown";

/// DatabaseProvider backed by the RDS API
#[derive(Debug, Clone)]
pub struct AwsRdsProvider {
    client: Client,
}

impl AwsRdsProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Load credentials and settings from the environment, the shared config
    /// files, or the instance role.
    ///
    /// `region` and `profile` override whatever the environment resolves.
    pub async fn from_env(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        tracing::debug!(region = ?config.region(), "Loaded AWS configuration");
        Self::new(Client::new(&config))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl DatabaseProvider for AwsRdsProvider {
    fn name(&self) -> &str {
        "aws-rds"
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<DbInstance> {
        request.validate()?;
        let context = ErrorContext::instance(&request.identifier);

        let tags: Vec<types::Tag> = request
            .tags
            .iter()
            .map(|t| types::Tag::builder().key(&t.key).value(&t.value).build())
            .collect();

        let output = self
            .client
            .create_db_instance()
            .db_instance_identifier(&request.identifier)
            .db_instance_class(&request.class)
            .engine(&request.engine)
            .set_engine_version(request.engine_version.clone())
            .allocated_storage(request.allocated_storage)
            .master_username(&request.master_username)
            .master_user_password(&request.master_password)
            .set_db_subnet_group_name(request.subnet_group.clone())
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|e| classify(e, context))?;

        instance_or_missing(output.db_instance(), &request.identifier)
    }

    async fn describe_instance(&self, identifier: &str) -> Result<DbInstance> {
        let output = self
            .client
            .describe_db_instances()
            .db_instance_identifier(identifier)
            .send()
            .await
            .map_err(|e| classify(e, ErrorContext::instance(identifier)))?;

        instance_or_missing(output.db_instances().first(), identifier)
    }

    async fn modify_instance(&self, request: &ModifyInstanceRequest) -> Result<DbInstance> {
        request.validate()?;
        let security_groups =
            Some(request.security_groups.clone()).filter(|groups| !groups.is_empty());

        let output = self
            .client
            .modify_db_instance()
            .db_instance_identifier(&request.identifier)
            .set_db_instance_class(request.class.clone())
            .set_vpc_security_group_ids(security_groups)
            .apply_immediately(request.apply_immediately)
            .send()
            .await
            .map_err(|e| classify(e, ErrorContext::instance(&request.identifier)))?;

        instance_or_missing(output.db_instance(), &request.identifier)
    }

    async fn delete_instance(&self, request: &DeleteInstanceRequest) -> Result<DbInstance> {
        request.validate()?;
        let mut context = ErrorContext::instance(&request.identifier);

        let mut call = self
            .client
            .delete_db_instance()
            .db_instance_identifier(&request.identifier);
        call = match &request.final_snapshot {
            FinalSnapshot::Skip => call.skip_final_snapshot(true),
            FinalSnapshot::Take(snapshot_id) => {
                context = context.snapshot(snapshot_id);
                call.skip_final_snapshot(false)
                    .final_db_snapshot_identifier(snapshot_id)
            }
        };

        let output = call.send().await.map_err(|e| classify(e, context))?;
        instance_or_missing(output.db_instance(), &request.identifier)
    }

    async fn restore_instance_from_snapshot(
        &self,
        request: &RestoreInstanceRequest,
    ) -> Result<DbInstance> {
        request.validate()?;
        let context =
            ErrorContext::instance(&request.identifier).snapshot(&request.snapshot_identifier);

        let output = self
            .client
            .restore_db_instance_from_db_snapshot()
            .db_instance_identifier(&request.identifier)
            .db_snapshot_identifier(&request.snapshot_identifier)
            .set_db_instance_class(request.class.clone())
            .engine(&request.engine)
            .set_db_subnet_group_name(request.subnet_group.clone())
            .send()
            .await
            .map_err(|e| classify(e, context))?;

        instance_or_missing(output.db_instance(), &request.identifier)
    }

    async fn create_snapshot(&self, request: &CreateSnapshotRequest) -> Result<DbSnapshot> {
        request.validate()?;
        let context = ErrorContext::instance(&request.instance_identifier)
            .snapshot(&request.snapshot_identifier);

        let output = self
            .client
            .create_db_snapshot()
            .db_instance_identifier(&request.instance_identifier)
            .db_snapshot_identifier(&request.snapshot_identifier)
            .send()
            .await
            .map_err(|e| classify(e, context))?;

        output
            .db_snapshot()
            .map(convert_snapshot)
            .ok_or_else(|| RdsError::SnapshotNotFound(request.snapshot_identifier.clone()))
    }

    async fn describe_snapshots(
        &self,
        instance_identifier: Option<&str>,
    ) -> Result<Vec<DbSnapshot>> {
        let context = ErrorContext {
            instance: instance_identifier,
            snapshot: None,
        };
        let mut snapshots = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .describe_db_snapshots()
                .set_db_instance_identifier(instance_identifier.map(str::to_string))
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| classify(e, context))?;

            snapshots.extend(output.db_snapshots().iter().map(convert_snapshot));

            // Handle pagination
            match output.marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        tracing::debug!(count = snapshots.len(), "Described snapshots");
        Ok(snapshots)
    }
}

fn instance_or_missing(instance: Option<&types::DbInstance>, identifier: &str) -> Result<DbInstance> {
    instance
        .map(|i| convert_instance(i, identifier))
        .ok_or_else(|| RdsError::InstanceNotFound(identifier.to_string()))
}

/// Convert an SDK instance, falling back to `identifier` when the response
/// omits it
pub(crate) fn convert_instance(instance: &types::DbInstance, identifier: &str) -> DbInstance {
    DbInstance {
        identifier: instance
            .db_instance_identifier()
            .unwrap_or(identifier)
            .to_string(),
        class: instance.db_instance_class().map(str::to_string),
        status: instance
            .db_instance_status()
            .unwrap_or(UNKNOWN_STATUS)
            .to_string(),
        endpoint: instance.endpoint().and_then(|e| {
            e.address().map(|address| Endpoint {
                address: address.to_string(),
                port: e.port(),
            })
        }),
        allocated_storage: instance.allocated_storage(),
        engine: instance.engine().map(str::to_string),
        availability_zone: instance.availability_zone().map(str::to_string),
        master_username: instance.master_username().map(str::to_string),
        security_groups: instance
            .vpc_security_groups()
            .iter()
            .filter_map(|g| g.vpc_security_group_id().map(str::to_string))
            .collect(),
    }
}

pub(crate) fn convert_snapshot(snapshot: &types::DbSnapshot) -> DbSnapshot {
    DbSnapshot {
        identifier: snapshot
            .db_snapshot_identifier()
            .unwrap_or_default()
            .to_string(),
        source_instance: snapshot
            .db_instance_identifier()
            .unwrap_or_default()
            .to_string(),
        created_at: snapshot
            .snapshot_create_time()
            .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos())),
        status: snapshot.status().map(str::to_string),
        allocated_storage: snapshot.allocated_storage(),
        master_username: snapshot.master_username().map(str::to_string),
    }
}
