//! Odin RDS lifecycle core
//!
//! Provider-agnostic orchestration of managed PostgreSQL instances: create,
//! clone from the newest snapshot of another instance, restore, scale,
//! delete, and snapshot management.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                    odin CLI                     │
//! │        (instance create/clone/... snapshot)     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                   odin-rds                      │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │  Lifecycle   │──│    Waiter    │             │
//! │  └──────┬───────┘  └──────────────┘             │
//! │  ┌──────▼───────────────────────────────────┐   │
//! │  │   trait DatabaseProvider { ... }         │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │ odin-rds-aws  │ │   in-memory   │
//! │  (aws-sdk)    │ │  (tests)      │
//! └───────────────┘ └───────────────┘
//! ```

pub mod error;
pub mod instance;
pub mod lifecycle;
pub mod memory;
pub mod provider;
pub mod snapshot;
pub mod waiter;

// Re-exports
pub use error::{ErrorKind, RdsError, Result};
pub use instance::{Instance, MAX_SIZE_GB, MIN_SIZE_GB};
pub use lifecycle::Lifecycle;
pub use memory::InMemoryProvider;
pub use provider::{
    CreateInstanceRequest, CreateSnapshotRequest, DatabaseProvider, DbInstance, DbSnapshot,
    DeleteInstanceRequest, Endpoint, FinalSnapshot, ModifyInstanceRequest,
    RestoreInstanceRequest, Tag,
};
pub use snapshot::{SNAPSHOT_TIME_FORMAT, create_snapshot, last_snapshot, list_snapshots, print_snapshots};
pub use waiter::{WaitConfig, Waiter};
