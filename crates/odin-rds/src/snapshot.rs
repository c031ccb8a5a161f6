//! Snapshot lookup, listing and creation

use crate::error::{RdsError, Result};
use crate::provider::{CreateSnapshotRequest, DatabaseProvider, DbSnapshot};

/// Timestamp layout used when printing snapshots, e.g. `2015-06-11T22:00:00+00:00`
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// List snapshots newest first.
///
/// With `instance_id` set only that instance's snapshots are returned. The
/// sort is stable, so snapshots with identical creation times keep the order
/// the provider returned them in. Snapshots still being taken (no creation
/// time yet) go last.
pub async fn list_snapshots<P>(provider: &P, instance_id: Option<&str>) -> Result<Vec<DbSnapshot>>
where
    P: DatabaseProvider + ?Sized,
{
    let instance_id = instance_id.filter(|id| !id.is_empty());
    let mut snapshots = provider.describe_snapshots(instance_id).await?;
    snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    tracing::debug!(
        instance = instance_id.unwrap_or("*"),
        count = snapshots.len(),
        "Listed snapshots"
    );
    Ok(snapshots)
}

/// Most recent snapshot taken from `instance_id`
pub async fn last_snapshot<P>(provider: &P, instance_id: &str) -> Result<DbSnapshot>
where
    P: DatabaseProvider + ?Sized,
{
    if instance_id.is_empty() {
        return Err(RdsError::NoSnapshotFound(instance_id.to_string()));
    }

    list_snapshots(provider, Some(instance_id))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RdsError::NoSnapshotFound(instance_id.to_string()))
}

/// Take a manual snapshot of an instance
pub async fn create_snapshot<P>(
    provider: &P,
    instance_id: &str,
    snapshot_id: &str,
) -> Result<DbSnapshot>
where
    P: DatabaseProvider + ?Sized,
{
    let request = CreateSnapshotRequest {
        instance_identifier: instance_id.to_string(),
        snapshot_identifier: snapshot_id.to_string(),
    };
    request.validate()?;

    tracing::info!(instance = instance_id, snapshot = snapshot_id, "Creating snapshot");
    provider.create_snapshot(&request).await
}

/// Render one line per snapshot: `<id> <source instance> <created> <status>`
pub fn print_snapshots(snapshots: &[DbSnapshot]) -> String {
    snapshots.iter().map(format_snapshot).collect()
}

fn format_snapshot(snapshot: &DbSnapshot) -> String {
    let created = snapshot
        .created_at
        .map(|t| t.format(SNAPSHOT_TIME_FORMAT).to_string())
        .unwrap_or_else(|| "pending".to_string());

    format!(
        "{} {} {} {}\n",
        snapshot.identifier,
        snapshot.source_instance,
        created,
        snapshot.status.as_deref().unwrap_or("unknown")
    )
}
