//! In-memory database provider
//!
//! A [`DatabaseProvider`] that keeps instances and snapshots in process and
//! advances their statuses the way RDS does, one step per describe call.
//! It backs the unit and integration tests of the lifecycle core.

use crate::error::{RdsError, Result};
use crate::provider::{
    CreateInstanceRequest, CreateSnapshotRequest, DatabaseProvider, DbInstance, DbSnapshot,
    DeleteInstanceRequest, Endpoint, FinalSnapshot, ModifyInstanceRequest,
    RestoreInstanceRequest, STATUS_AVAILABLE, STATUS_CREATING, STATUS_DELETING,
    STATUS_MODIFYING,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

const DEFAULT_ZONE: &str = "us-east-1c";
const DEFAULT_PORT: i32 = 5432;

#[derive(Debug, Default)]
struct Store {
    instances: Vec<DbInstance>,
    snapshots: Vec<DbSnapshot>,
}

impl Store {
    fn position(&self, identifier: &str) -> Result<usize> {
        self.instances
            .iter()
            .position(|i| i.identifier == identifier)
            .ok_or_else(|| RdsError::InstanceNotFound(identifier.to_string()))
    }

    fn has_instance(&self, identifier: &str) -> bool {
        self.instances.iter().any(|i| i.identifier == identifier)
    }

    fn has_snapshot(&self, identifier: &str) -> bool {
        self.snapshots.iter().any(|s| s.identifier == identifier)
    }
}

/// Provider test double backed by plain vectors
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    store: Mutex<Store>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(self, instances: Vec<DbInstance>) -> Self {
        self.lock().instances = instances;
        self
    }

    pub fn with_snapshots(self, snapshots: Vec<DbSnapshot>) -> Self {
        self.lock().snapshots = snapshots;
        self
    }

    /// Current state of an instance without advancing it
    pub fn instance(&self, identifier: &str) -> Option<DbInstance> {
        self.lock()
            .instances
            .iter()
            .find(|i| i.identifier == identifier)
            .cloned()
    }

    pub fn snapshot(&self, identifier: &str) -> Option<DbSnapshot> {
        self.lock()
            .snapshots
            .iter()
            .find(|s| s.identifier == identifier)
            .cloned()
    }

    pub fn snapshots(&self) -> Vec<DbSnapshot> {
        self.lock().snapshots.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // A poisoned store only means another test thread panicked mid-update
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn region_of(zone: &str) -> &str {
    zone.trim_end_matches(|c: char| c.is_ascii_alphabetic())
}

fn new_instance(identifier: &str, class: Option<&str>, engine: &str) -> DbInstance {
    let mut instance = DbInstance::new(identifier, STATUS_CREATING);
    instance.class = class.map(str::to_string);
    instance.engine = Some(engine.to_string());
    instance.availability_zone = Some(DEFAULT_ZONE.to_string());
    instance
}

#[async_trait]
impl DatabaseProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<DbInstance> {
        request.validate()?;
        let mut store = self.lock();
        if store.has_instance(&request.identifier) {
            return Err(RdsError::InstanceAlreadyExists(request.identifier.clone()));
        }

        let mut instance = new_instance(&request.identifier, Some(&request.class), &request.engine);
        instance.allocated_storage = Some(request.allocated_storage);
        instance.master_username = Some(request.master_username.clone());
        store.instances.push(instance.clone());
        Ok(instance)
    }

    async fn describe_instance(&self, identifier: &str) -> Result<DbInstance> {
        let mut store = self.lock();
        let index = store.position(identifier)?;

        let status = store.instances[index].status.clone();
        match status.as_str() {
            STATUS_DELETING => return Ok(store.instances.remove(index)),
            STATUS_CREATING => {
                let instance = &mut store.instances[index];
                let zone = instance.availability_zone.as_deref().unwrap_or(DEFAULT_ZONE);
                instance.endpoint = Some(Endpoint {
                    address: format!(
                        "{}.0.{}.rds.amazonaws.com",
                        identifier,
                        region_of(zone)
                    ),
                    port: Some(DEFAULT_PORT),
                });
                instance.status = STATUS_AVAILABLE.to_string();
            }
            STATUS_MODIFYING => {
                store.instances[index].status = STATUS_AVAILABLE.to_string();
            }
            _ => {}
        }
        Ok(store.instances[index].clone())
    }

    async fn modify_instance(&self, request: &ModifyInstanceRequest) -> Result<DbInstance> {
        request.validate()?;
        let mut store = self.lock();
        let index = store.position(&request.identifier)?;
        let instance = &mut store.instances[index];
        if !instance.is_available() {
            return Err(RdsError::InstanceNotAvailable(request.identifier.clone()));
        }

        if !request.security_groups.is_empty() {
            instance.security_groups = request.security_groups.clone();
        }
        if request.apply_immediately {
            instance.status = STATUS_MODIFYING.to_string();
            if let Some(class) = &request.class {
                instance.class = Some(class.clone());
            }
        }
        Ok(instance.clone())
    }

    async fn delete_instance(&self, request: &DeleteInstanceRequest) -> Result<DbInstance> {
        request.validate()?;
        let mut store = self.lock();
        let index = store.position(&request.identifier)?;

        if let FinalSnapshot::Take(snapshot_id) = &request.final_snapshot {
            if store.has_snapshot(snapshot_id) {
                return Err(RdsError::SnapshotAlreadyExists(snapshot_id.clone()));
            }
            let source = &store.instances[index];
            let snapshot = DbSnapshot {
                identifier: snapshot_id.clone(),
                source_instance: source.identifier.clone(),
                created_at: Some(Utc::now()),
                status: Some(STATUS_AVAILABLE.to_string()),
                allocated_storage: source.allocated_storage,
                master_username: source.master_username.clone(),
            };
            store.snapshots.push(snapshot);
        }

        let instance = &mut store.instances[index];
        instance.status = STATUS_DELETING.to_string();
        Ok(instance.clone())
    }

    async fn restore_instance_from_snapshot(
        &self,
        request: &RestoreInstanceRequest,
    ) -> Result<DbInstance> {
        request.validate()?;
        let mut store = self.lock();
        let snapshot = store
            .snapshots
            .iter()
            .find(|s| s.identifier == request.snapshot_identifier)
            .cloned()
            .ok_or_else(|| RdsError::SnapshotNotFound(request.snapshot_identifier.clone()))?;
        if store.has_instance(&request.identifier) {
            return Err(RdsError::InstanceAlreadyExists(request.identifier.clone()));
        }

        let mut instance =
            new_instance(&request.identifier, request.class.as_deref(), &request.engine);
        instance.allocated_storage = snapshot.allocated_storage;
        instance.master_username = snapshot.master_username;
        store.instances.push(instance.clone());
        Ok(instance)
    }

    async fn create_snapshot(&self, request: &CreateSnapshotRequest) -> Result<DbSnapshot> {
        request.validate()?;
        let mut store = self.lock();
        let index = store.position(&request.instance_identifier)?;
        let source = &store.instances[index];
        if !source.is_available() {
            return Err(RdsError::InstanceNotAvailable(
                request.instance_identifier.clone(),
            ));
        }
        if store.has_snapshot(&request.snapshot_identifier) {
            return Err(RdsError::SnapshotAlreadyExists(
                request.snapshot_identifier.clone(),
            ));
        }

        let snapshot = DbSnapshot {
            identifier: request.snapshot_identifier.clone(),
            source_instance: source.identifier.clone(),
            created_at: Some(Utc::now()),
            status: Some(STATUS_AVAILABLE.to_string()),
            allocated_storage: source.allocated_storage,
            master_username: source.master_username.clone(),
        };
        store.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn describe_snapshots(
        &self,
        instance_identifier: Option<&str>,
    ) -> Result<Vec<DbSnapshot>> {
        let store = self.lock();
        Ok(store
            .snapshots
            .iter()
            .filter(|s| instance_identifier.is_none_or(|id| s.source_instance == id))
            .cloned()
            .collect())
    }
}
