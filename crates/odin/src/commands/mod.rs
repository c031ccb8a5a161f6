pub mod instance;
pub mod snapshot;
