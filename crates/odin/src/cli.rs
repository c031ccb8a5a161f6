use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "odin")]
#[command(about = "Create, clone, restore, scale and delete RDS instances", long_about = None)]
pub struct Cli {
    /// Config file (default: ODIN_CONFIG_PATH, ./odin.yaml, ./.odin.yaml, ~/.config/odin/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Named AWS profile
    #[arg(long, env = "AWS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Seconds between two status polls
    #[arg(long, global = true)]
    pub poll_interval: Option<u64>,

    /// Give up waiting after this many seconds (0 waits forever)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage database instances
    #[command(subcommand)]
    Instance(InstanceCommands),
    /// Manage database snapshots
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
    /// Show version information
    Version,
}

/// Placement options shared by create, clone and restore
#[derive(Args, Debug, Clone, Default)]
pub struct Placement {
    /// Instance class (default from config)
    #[arg(short = 't', long = "type")]
    pub class: Option<String>,

    /// DB subnet group name
    #[arg(short = 'n', long = "subnet-group")]
    pub subnet_group: Option<String>,

    /// VPC security group ids, comma separated
    #[arg(short = 'g', long = "security-groups", value_delimiter = ',')]
    pub security_groups: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// Create an empty instance
    Create {
        /// Instance identifier
        id: String,
        /// Master username
        #[arg(short, long)]
        user: String,
        /// Master password
        #[arg(short, long, env = "ODIN_MASTER_PASSWORD", hide_env_values = true)]
        password: String,
        /// Allocated storage in GB (5-6144)
        #[arg(short, long, default_value_t = 5)]
        size: i32,
        #[command(flatten)]
        placement: Placement,
    },
    /// Create an instance from the newest snapshot of another one
    Clone {
        /// Instance identifier
        id: String,
        /// Instance whose newest snapshot seeds the clone
        #[arg(long = "from")]
        from: String,
        /// Master password (the username comes from the snapshot)
        #[arg(short, long, env = "ODIN_MASTER_PASSWORD", hide_env_values = true)]
        password: String,
        #[command(flatten)]
        placement: Placement,
    },
    /// Restore the newest snapshot of another instance
    Restore {
        /// Instance identifier
        id: String,
        /// Instance whose newest snapshot is restored
        #[arg(long = "from")]
        from: String,
        #[command(flatten)]
        placement: Placement,
    },
    /// Change the class of an instance
    Scale {
        /// Instance identifier
        id: String,
        /// New instance class
        #[arg(short = 't', long = "type")]
        class: String,
        /// Apply during the next maintenance window instead of now
        #[arg(long)]
        delay: bool,
    },
    /// Delete an instance
    Delete {
        /// Instance identifier
        id: String,
        /// Take a final snapshot under this name
        #[arg(long)]
        final_snapshot: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Take a manual snapshot
    Create {
        /// Source instance identifier
        instance: String,
        /// Snapshot identifier
        snapshot: String,
    },
    /// List snapshots, newest first
    List {
        /// Only snapshots of this instance
        instance: Option<String>,
        /// Print JSON instead of one line per snapshot
        #[arg(long)]
        json: bool,
    },
}
