//! Database provider trait definition
//!
//! The lifecycle core never talks to AWS directly. Everything it needs from
//! the outside world goes through [`DatabaseProvider`], which is implemented
//! by the real RDS client (`odin-rds-aws`) and by the in-memory test double
//! in [`crate::memory`].

use crate::error::{RdsError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instance has finished whatever it was doing and accepts requests
pub const STATUS_AVAILABLE: &str = "available";
/// Pseudo status reached once the provider no longer knows the instance
pub const STATUS_DELETED: &str = "deleted";
pub const STATUS_CREATING: &str = "creating";
pub const STATUS_MODIFYING: &str = "modifying";
pub const STATUS_DELETING: &str = "deleting";

/// Engine family every instance is created with
pub const ENGINE: &str = "postgres";

/// Database provider abstraction trait
///
/// Request types are checked with their `validate()` method before anything
/// leaves the process; implementations must do the same and reject invalid
/// requests with [`RdsError::InvalidParameters`].
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Returns the provider name (e.g., "aws-rds", "in-memory")
    fn name(&self) -> &str;

    /// Submit a from-scratch (or snapshot-seeded) instance creation
    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<DbInstance>;

    /// Fetch the current state of a single instance
    async fn describe_instance(&self, identifier: &str) -> Result<DbInstance>;

    /// Change class and/or security groups of an instance
    async fn modify_instance(&self, request: &ModifyInstanceRequest) -> Result<DbInstance>;

    /// Delete an instance, optionally taking a final snapshot
    async fn delete_instance(&self, request: &DeleteInstanceRequest) -> Result<DbInstance>;

    /// Create a new instance from an existing snapshot
    async fn restore_instance_from_snapshot(
        &self,
        request: &RestoreInstanceRequest,
    ) -> Result<DbInstance>;

    /// Take a manual snapshot of an instance
    async fn create_snapshot(&self, request: &CreateSnapshotRequest) -> Result<DbSnapshot>;

    /// List snapshots, restricted to one source instance when given
    async fn describe_snapshots(
        &self,
        instance_identifier: Option<&str>,
    ) -> Result<Vec<DbSnapshot>>;
}

/// Network address clients use to reach an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: Option<i32>,
}

/// Provider view of a database instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbInstance {
    pub identifier: String,
    pub class: Option<String>,
    pub status: String,
    pub endpoint: Option<Endpoint>,
    pub allocated_storage: Option<i32>,
    pub engine: Option<String>,
    pub availability_zone: Option<String>,
    pub master_username: Option<String>,
    pub security_groups: Vec<String>,
}

impl DbInstance {
    pub fn new(identifier: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            class: None,
            status: status.into(),
            endpoint: None,
            allocated_storage: None,
            engine: None,
            availability_zone: None,
            master_username: None,
            security_groups: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == STATUS_AVAILABLE
    }

    /// Endpoint address, if the provider has assigned one yet
    pub fn address(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.address.as_str())
    }
}

/// Point-in-time backup of an instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbSnapshot {
    pub identifier: String,
    pub source_instance: String,
    /// Unset while the provider is still taking the snapshot
    pub created_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub allocated_storage: Option<i32>,
    pub master_username: Option<String>,
}

impl DbSnapshot {
    pub fn new(identifier: impl Into<String>, source_instance: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            source_instance: source_instance.into(),
            created_at: None,
            status: None,
            allocated_storage: None,
            master_username: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_storage(mut self, allocated_storage: i32) -> Self {
        self.allocated_storage = Some(allocated_storage);
        self
    }

    pub fn with_master_username(mut self, username: impl Into<String>) -> Self {
        self.master_username = Some(username.into());
        self
    }
}

/// Resource tag attached at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    pub identifier: String,
    pub class: String,
    pub engine: String,
    pub engine_version: Option<String>,
    pub allocated_storage: i32,
    pub master_username: String,
    pub master_password: String,
    pub subnet_group: Option<String>,
    pub tags: Vec<Tag>,
}

impl CreateInstanceRequest {
    pub fn validate(&self) -> Result<()> {
        require("DBInstanceIdentifier", &self.identifier)?;
        require("DBInstanceClass", &self.class)?;
        require("Engine", &self.engine)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreInstanceRequest {
    pub identifier: String,
    pub snapshot_identifier: String,
    pub class: Option<String>,
    pub engine: String,
    pub subnet_group: Option<String>,
}

impl RestoreInstanceRequest {
    pub fn validate(&self) -> Result<()> {
        require("DBInstanceIdentifier", &self.identifier)?;
        require("DBSnapshotIdentifier", &self.snapshot_identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyInstanceRequest {
    pub identifier: String,
    /// New instance class, left unchanged when `None`
    pub class: Option<String>,
    /// VPC security group ids; empty leaves the current set untouched
    pub security_groups: Vec<String>,
    /// `false` defers the change to the next maintenance window
    pub apply_immediately: bool,
}

impl ModifyInstanceRequest {
    pub fn validate(&self) -> Result<()> {
        require("DBInstanceIdentifier", &self.identifier)
    }
}

/// What to do with the data of an instance being deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSnapshot {
    Skip,
    Take(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteInstanceRequest {
    pub identifier: String,
    pub final_snapshot: FinalSnapshot,
}

impl DeleteInstanceRequest {
    pub fn validate(&self) -> Result<()> {
        require("DBInstanceIdentifier", &self.identifier)?;
        if let FinalSnapshot::Take(id) = &self.final_snapshot {
            require("FinalDBSnapshotIdentifier", id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSnapshotRequest {
    pub instance_identifier: String,
    pub snapshot_identifier: String,
}

impl CreateSnapshotRequest {
    pub fn validate(&self) -> Result<()> {
        require("DBInstanceIdentifier", &self.instance_identifier)?;
        require("DBSnapshotIdentifier", &self.snapshot_identifier)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RdsError::InvalidParameters(format!(
            "missing required field, {}",
            field
        )));
    }
    Ok(())
}
