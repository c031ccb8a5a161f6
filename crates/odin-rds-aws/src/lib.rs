//! AWS RDS provider for odin
//!
//! Implements [`odin_rds::DatabaseProvider`] on top of `aws-sdk-rds`, so the
//! lifecycle actions in `odin-rds` can drive real database instances.
//!
//! # Requirements
//!
//! - AWS credentials resolvable by the default provider chain
//!   (environment, `~/.aws/credentials`, SSO, instance role)
//! - A region, either configured or passed to [`AwsRdsProvider::from_env`]
//!
//! # Example
//!
//! ```ignore
//! use odin_rds::{Instance, Lifecycle, WaitConfig};
//! use odin_rds_aws::AwsRdsProvider;
//!
//! let provider = AwsRdsProvider::from_env(Some("us-east-1"), None).await;
//! let lifecycle = Lifecycle::new(&provider, WaitConfig::default());
//!
//! let instance = Instance::new("test1")
//!     .with_class("db.m1.small")
//!     .with_credentials("master", "secret")
//!     .with_size(5);
//! let endpoint = lifecycle.create_instance(&instance).await?;
//! ```

pub mod error;
pub mod provider;

pub use error::{ErrorContext, classify};
pub use provider::AwsRdsProvider;
