pub mod config;
pub mod git;
pub mod journal;
pub mod paths;
pub mod pipeline;

// Re-export commonly used types
pub use config::DeployConfig;
pub use journal::{DeployRecord, Journal};
pub use pipeline::{ChangeSet, DeployOutcome, Snapshot};
