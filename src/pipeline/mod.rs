//! The deploy pipeline
//!
//! Five stages, run in order by [`publish::deploy`]:
//! 1. scan    - snapshot the build directory (path -> content digest)
//! 2. sync    - clone or fetch the cache clone, check out the hosting branch
//! 3. diff    - snapshot vs deployed tree -> change set
//! 4. stage   - apply the change set to the cache worktree
//! 5. publish - commit, journal, guarded push with rollback on failure

pub mod diff;
pub mod publish;
pub mod scan;
pub mod stage;

pub use diff::ChangeSet;
pub use publish::{
    deploy, preview, resolve_url, rollback, DeployOutcome, PublishOptions, RollbackOutcome,
    Target,
};
pub use scan::{scan, Snapshot};
