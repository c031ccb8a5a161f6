use crate::cli::{InstanceCommands, Placement};
use odin_config::OdinConfig;
use odin_rds::{DatabaseProvider, Instance, Lifecycle};

/// Run an instance subcommand and return what goes to stdout
pub async fn handle<P>(
    lifecycle: &Lifecycle<'_, P>,
    config: &OdinConfig,
    command: InstanceCommands,
) -> anyhow::Result<String>
where
    P: DatabaseProvider + ?Sized,
{
    match command {
        InstanceCommands::Create {
            id,
            user,
            password,
            size,
            placement,
        } => {
            let instance = placed(Instance::new(id), &placement, config)
                .with_credentials(user, password)
                .with_size(size);
            Ok(lifecycle.create_instance(&instance).await?)
        }
        InstanceCommands::Clone {
            id,
            from,
            password,
            placement,
        } => {
            let instance = placed(Instance::new(id), &placement, config)
                .with_password(password)
                .with_original_instance(from);
            Ok(lifecycle.clone_instance(&instance).await?)
        }
        InstanceCommands::Restore {
            id,
            from,
            placement,
        } => {
            let instance =
                placed(Instance::new(id), &placement, config).with_original_instance(from);
            Ok(lifecycle.restore_instance(&instance).await?)
        }
        InstanceCommands::Scale { id, class, delay } => {
            let instance = Instance::new(id).with_class(class);
            Ok(lifecycle.scale_instance(&instance, delay).await?)
        }
        InstanceCommands::Delete { id, final_snapshot } => {
            let mut instance = Instance::new(id.as_str());
            if let Some(snapshot_id) = final_snapshot {
                instance = instance.with_final_snapshot(snapshot_id);
            }
            lifecycle.delete_instance(&instance).await?;
            Ok(format!("Instance {} deleted", id))
        }
    }
}

/// Apply command line placement, falling back to config defaults
fn placed(instance: Instance, placement: &Placement, config: &OdinConfig) -> Instance {
    let class = placement
        .class
        .clone()
        .unwrap_or_else(|| config.instance_class.clone());
    let security_groups = if placement.security_groups.is_empty() {
        config.security_groups.clone()
    } else {
        placement.security_groups.clone()
    };

    let mut instance = instance
        .with_class(class)
        .with_security_groups(security_groups);
    if let Some(subnet_group) = placement.subnet_group.as_ref().or(config.subnet_group.as_ref()) {
        instance = instance.with_subnet_group(subnet_group.as_str());
    }
    if let Some(version) = &config.engine_version {
        instance = instance.with_engine_version(version.as_str());
    }
    instance
}
