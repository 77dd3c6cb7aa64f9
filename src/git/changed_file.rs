//! Per-file change records handed to the context builder.

use std::fmt;

/// How a file changed in a commit or in the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// File was created.
    Added,
    /// File content changed (renames, copies and type changes included).
    Modified,
    /// File was removed.
    Deleted,
}

impl FileStatus {
    /// Maps a libgit2 delta to the coarse status used in prompts.
    pub fn from_delta(delta: git2::Delta) -> Self {
        match delta {
            git2::Delta::Added | git2::Delta::Untracked => Self::Added,
            git2::Delta::Deleted => Self::Deleted,
            _ => Self::Modified,
        }
    }

    /// Single-letter git status code.
    pub fn code(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A file together with the diff text describing its change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// Unified diff text, or a summary marker once the context builder has
    /// reduced it.
    pub diff: String,
    /// Kind of change.
    pub status: FileStatus,
}

impl ChangedFile {
    /// Creates a change record.
    pub fn new(filename: impl Into<String>, diff: impl Into<String>, status: FileStatus) -> Self {
        Self {
            filename: filename.into(),
            diff: diff.into(),
            status,
        }
    }

    /// Returns a copy of this record with a different diff body.
    pub fn with_diff(&self, diff: String) -> Self {
        Self {
            filename: self.filename.clone(),
            diff,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_mapping() {
        assert_eq!(FileStatus::from_delta(git2::Delta::Added), FileStatus::Added);
        assert_eq!(
            FileStatus::from_delta(git2::Delta::Deleted),
            FileStatus::Deleted
        );
        assert_eq!(
            FileStatus::from_delta(git2::Delta::Renamed),
            FileStatus::Modified
        );
        assert_eq!(
            FileStatus::from_delta(git2::Delta::Typechange),
            FileStatus::Modified
        );
    }

    #[test]
    fn with_diff_keeps_identity() {
        let original = ChangedFile::new("src/main.rs", "+a", FileStatus::Added);
        let replaced = original.with_diff("summary".to_string());
        assert_eq!(replaced.filename, "src/main.rs");
        assert_eq!(replaced.status, FileStatus::Added);
        assert_eq!(replaced.diff, "summary");
        assert_eq!(original.diff, "+a");
    }

    #[test]
    fn status_display_is_git_code() {
        assert_eq!(FileStatus::Deleted.to_string(), "D");
    }
}
