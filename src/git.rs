//! Git operations: history listing, per-file diffs, staging and committing.

pub mod changed_file;
pub mod repository;

pub use changed_file::{ChangedFile, FileStatus};
pub use repository::{CommitSummary, GitRepository};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
