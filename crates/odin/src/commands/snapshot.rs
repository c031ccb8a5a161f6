use crate::cli::SnapshotCommands;
use odin_rds::{DatabaseProvider, Lifecycle, print_snapshots};

pub async fn handle<P>(lifecycle: &Lifecycle<'_, P>, command: SnapshotCommands) -> anyhow::Result<String>
where
    P: DatabaseProvider + ?Sized,
{
    match command {
        SnapshotCommands::Create { instance, snapshot } => {
            let created = lifecycle.create_snapshot(&instance, &snapshot).await?;
            Ok(print_snapshots(std::slice::from_ref(&created))
                .trim_end()
                .to_string())
        }
        SnapshotCommands::List { instance, json } => {
            let snapshots = lifecycle.list_snapshots(instance.as_deref()).await?;
            if json {
                Ok(serde_json::to_string_pretty(&snapshots)?)
            } else {
                Ok(print_snapshots(&snapshots).trim_end().to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use odin_rds::provider::STATUS_AVAILABLE;
    use odin_rds::{DbInstance, DbSnapshot, InMemoryProvider, WaitConfig};

    #[tokio::test]
    async fn test_create_then_list() {
        let provider = InMemoryProvider::new()
            .with_instances(vec![DbInstance::new("test1", STATUS_AVAILABLE)]);
        let lifecycle = Lifecycle::new(&provider, WaitConfig::immediate());

        let create = SnapshotCommands::Create {
            instance: "test1".to_string(),
            snapshot: "test1-manual".to_string(),
        };
        let output = handle(&lifecycle, create).await.unwrap();
        assert!(output.starts_with("test1-manual test1 "));
        assert!(output.ends_with(" available"));

        let list = SnapshotCommands::List {
            instance: Some("test1".to_string()),
            json: false,
        };
        let output = handle(&lifecycle, list).await.unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_list_json() {
        let provider = InMemoryProvider::new()
            .with_snapshots(vec![DbSnapshot::new("manual-1", "test1").with_status("creating")]);
        let lifecycle = Lifecycle::new(&provider, WaitConfig::immediate());

        let list = SnapshotCommands::List {
            instance: None,
            json: true,
        };
        let output = handle(&lifecycle, list).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["identifier"], "manual-1");
        assert_eq!(parsed[0]["status"], "creating");
        assert!(parsed[0]["created_at"].is_null());
    }

    #[tokio::test]
    async fn test_create_for_missing_instance() {
        let provider = InMemoryProvider::new();
        let lifecycle = Lifecycle::new(&provider, WaitConfig::immediate());

        let create = SnapshotCommands::Create {
            instance: "test2".to_string(),
            snapshot: "snap".to_string(),
        };
        let err = handle(&lifecycle, create).await.unwrap_err();
        assert_eq!(err.to_string(), "no such instance test2");
    }
}
