//! Git plumbing for the deploy pipeline
//!
//! Handles:
//! - Cache clone management (clone, fetch, branch checkout)
//! - Staging, committing and guarded pushes
//! - Remote URL parsing and cache keys
//!
//! Everything shells out to the system `git` binary; authentication is
//! whatever the user's git/ssh configuration provides.

pub mod operations;
pub mod remote;

pub use operations::{
    add_all, checkout_branch, checkout_orphan, clone, commit, config_get, config_set,
    delete_branch, fetch, has_staged_changes, head_sha, is_repo, local_branch_exists,
    ls_remote_head, push_guarded, remote_branch_exists, remote_url, reset_hard, rev_parse,
    PushOutcome,
};
pub use remote::{cache_key, normalize_url, parse_owner_repo, push_with_retry};
