//! Instance parameters and provider request builders
//!
//! [`Instance`] carries everything any lifecycle action may need. The
//! `*_db_input` methods turn it into provider requests and enforce the local
//! rules (credentials, storage range, clone/restore source) before anything
//! reaches the network.

use crate::error::{RdsError, Result};
use crate::provider::{
    CreateInstanceRequest, DatabaseProvider, DbSnapshot, DeleteInstanceRequest, ENGINE,
    FinalSnapshot, ModifyInstanceRequest, RestoreInstanceRequest, Tag,
};
use crate::snapshot;

/// Smallest allocated storage accepted for a from-scratch create, in GB
pub const MIN_SIZE_GB: i32 = 5;
/// Largest allocated storage accepted for a from-scratch create, in GB
pub const MAX_SIZE_GB: i32 = 6144;

/// Parameters of a database instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instance {
    pub identifier: String,
    /// Instance class, e.g. `db.m1.small`
    pub class: String,
    pub user: String,
    pub password: String,
    pub subnet_group_name: String,
    /// Attached after creation through a modify call, never at create time
    pub security_groups: Vec<String>,
    /// Allocated storage in GB
    pub size: i32,
    /// Source instance for clone and restore
    pub original_instance_name: Option<String>,
    pub last_snapshot: Option<DbSnapshot>,
    /// Take a final snapshot under this id when deleting
    pub final_snapshot_id: Option<String>,
    pub engine_version: Option<String>,
}

impl Instance {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_size(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    pub fn with_subnet_group(mut self, subnet_group_name: impl Into<String>) -> Self {
        self.subnet_group_name = subnet_group_name.into();
        self
    }

    pub fn with_security_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security_groups = groups
            .into_iter()
            .map(Into::into)
            .filter(|g: &String| !g.trim().is_empty())
            .collect();
        self
    }

    pub fn with_original_instance(mut self, name: impl Into<String>) -> Self {
        self.original_instance_name = Some(name.into());
        self
    }

    pub fn with_final_snapshot(mut self, snapshot_id: impl Into<String>) -> Self {
        self.final_snapshot_id = Some(snapshot_id.into());
        self
    }

    pub fn with_engine_version(mut self, version: impl Into<String>) -> Self {
        self.engine_version = Some(version.into());
        self
    }

    /// Source instance name, with an empty string treated as unset
    pub fn original_instance(&self) -> Option<&str> {
        non_empty(self.original_instance_name.as_deref())
    }

    /// Resolve the latest snapshot of the source instance and attach it
    pub async fn with_last_snapshot<P>(mut self, provider: &P) -> Result<Self>
    where
        P: DatabaseProvider + ?Sized,
    {
        let original = self
            .original_instance()
            .ok_or(RdsError::MissingOriginalInstance)?;
        let snapshot = snapshot::last_snapshot(provider, original).await?;

        tracing::debug!(
            instance = %self.identifier,
            snapshot = %snapshot.identifier,
            "Resolved source snapshot"
        );
        self.last_snapshot = Some(snapshot);
        Ok(self)
    }

    /// Creation request for this instance.
    ///
    /// With a snapshot attached, allocated storage and master username come
    /// from the snapshot and the storage range is not checked: a clone keeps
    /// the footprint of its source. Checks run in order: master user, then
    /// password, then size.
    pub fn create_db_input(&self) -> Result<CreateInstanceRequest> {
        let mut allocated_storage = self.size;
        let mut master_username = self.user.clone();
        if let Some(snapshot) = &self.last_snapshot {
            if let Some(storage) = snapshot.allocated_storage {
                allocated_storage = storage;
            }
            if let Some(username) = &snapshot.master_username {
                master_username = username.clone();
            }
        }

        if master_username.is_empty() {
            return Err(RdsError::MissingMasterUser);
        }
        if self.password.is_empty() {
            return Err(RdsError::MissingMasterPassword);
        }
        if self.last_snapshot.is_none() && !(MIN_SIZE_GB..=MAX_SIZE_GB).contains(&self.size) {
            return Err(RdsError::InvalidSize(self.size));
        }

        let request = CreateInstanceRequest {
            identifier: self.identifier.clone(),
            class: self.class.clone(),
            engine: ENGINE.to_string(),
            engine_version: non_empty(self.engine_version.as_deref()).map(str::to_string),
            allocated_storage,
            master_username,
            master_password: self.password.clone(),
            subnet_group: non_empty(Some(self.subnet_group_name.as_str())).map(str::to_string),
            tags: vec![Tag {
                key: "Name".to_string(),
                value: self.identifier.clone(),
            }],
        };
        request.validate()?;
        Ok(request)
    }

    /// Creation request seeded from the newest snapshot of the source instance
    pub async fn clone_db_input<P>(&self, provider: &P) -> Result<CreateInstanceRequest>
    where
        P: DatabaseProvider + ?Sized,
    {
        self.clone().with_last_snapshot(provider).await?.create_db_input()
    }

    /// Restore request pointing at the newest snapshot of the source instance
    pub async fn restore_db_input<P>(&self, provider: &P) -> Result<RestoreInstanceRequest>
    where
        P: DatabaseProvider + ?Sized,
    {
        let original = self
            .original_instance()
            .ok_or(RdsError::MissingOriginalInstance)?;
        let snapshot_identifier = snapshot::last_snapshot(provider, original)
            .await?
            .identifier;

        let request = RestoreInstanceRequest {
            identifier: self.identifier.clone(),
            snapshot_identifier,
            class: non_empty(Some(self.class.as_str())).map(str::to_string),
            engine: ENGINE.to_string(),
            subnet_group: non_empty(Some(self.subnet_group_name.as_str())).map(str::to_string),
        };
        request.validate()?;
        Ok(request)
    }

    /// Modification carrying the class and security groups of this instance
    pub fn modify_db_input(&self, apply_now: bool) -> Result<ModifyInstanceRequest> {
        let request = ModifyInstanceRequest {
            identifier: self.identifier.clone(),
            class: non_empty(Some(self.class.as_str())).map(str::to_string),
            security_groups: self.security_groups.clone(),
            apply_immediately: apply_now,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn delete_db_input(&self) -> Result<DeleteInstanceRequest> {
        let final_snapshot = match non_empty(self.final_snapshot_id.as_deref()) {
            Some(id) => FinalSnapshot::Take(id.to_string()),
            None => FinalSnapshot::Skip,
        };
        let request = DeleteInstanceRequest {
            identifier: self.identifier.clone(),
            final_snapshot,
        };
        request.validate()?;
        Ok(request)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
