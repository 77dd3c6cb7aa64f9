//! Git repository operations

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{
    Commit, Cred, CredentialType, Diff, DiffOptions, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository, Tree,
};
use tracing::{debug, info, warn};

use crate::git::{ChangedFile, FileStatus, SHORT_HASH_LEN};

/// Maximum length of a commit subject in listings.
const SUBJECT_DISPLAY_LEN: usize = 100;

/// Git repository wrapper
pub struct GitRepository {
    repo: Repository,
}

/// One line of commit history.
#[derive(Debug, Clone)]
pub struct CommitSummary {
    /// Full SHA-1 hash.
    pub hash: String,
    /// Abbreviated hash for display.
    pub short_hash: String,
    /// Author date with the author's offset.
    pub date: DateTime<FixedOffset>,
    /// First line of the message, truncated for display.
    pub subject: String,
}

impl GitRepository {
    /// Open repository at current directory
    pub fn open() -> Result<Self> {
        let repo = Repository::open(".").context("Not in a git repository")?;

        Ok(Self { repo })
    }

    /// Open repository at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Lists commits reachable from HEAD, newest first.
    pub fn recent_commits(&self, skip: usize, limit: usize) -> Result<Vec<CommitSummary>> {
        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker.push_head().context("Failed to start history walk at HEAD")?;

        let mut commits = Vec::new();
        for oid in walker.skip(skip).take(limit) {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self
                .repo
                .find_commit(oid)
                .context("Failed to find commit")?;
            commits.push(summarize_commit(&commit)?);
        }

        Ok(commits)
    }

    /// Resolves a revision (hash, ref, `HEAD~2`) to its full hash.
    pub fn resolve_commit(&self, rev: &str) -> Result<String> {
        Ok(self.find_commit(rev)?.id().to_string())
    }

    fn find_commit(&self, rev: &str) -> Result<Commit<'_>> {
        self.repo
            .revparse_single(rev)
            .with_context(|| format!("Failed to parse commit: {rev}"))?
            .peel_to_commit()
            .with_context(|| format!("{rev} does not name a commit"))
    }

    /// Returns every file changed by a commit relative to its first parent,
    /// with that file's patch text.
    pub fn commit_changed_files(&self, rev: &str) -> Result<Vec<ChangedFile>> {
        let commit = self.find_commit(rev)?;
        let commit_tree = commit.tree().context("Failed to get commit tree")?;

        let parent_tree = if commit.parent_count() > 0 {
            Some(
                commit
                    .parent(0)
                    .context("Failed to get parent commit")?
                    .tree()
                    .context("Failed to get parent tree")?,
            )
        } else {
            None
        };

        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&commit_tree), Some(&mut opts))
            .context("Failed to create diff")?;

        collect_changed_files(&diff)
    }

    /// Returns every staged file (HEAD tree against the index).
    pub fn staged_changed_files(&self) -> Result<Vec<ChangedFile>> {
        let head_tree = self.head_tree()?;
        let index = self.repo.index().context("Failed to read index")?;

        let mut opts = DiffOptions::new();
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut opts))
            .context("Failed to diff HEAD against the index")?;

        collect_changed_files(&diff)
    }

    /// HEAD's tree, or `None` on an unborn branch.
    fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(
                head.peel_to_tree().context("Failed to peel HEAD to tree")?,
            )),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e).context("Failed to get HEAD reference"),
        }
    }

    /// Stages every change in the working tree, including deletions.
    pub fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index().context("Failed to read index")?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .context("Failed to stage working tree changes")?;
        index
            .update_all(["*"].iter(), None)
            .context("Failed to stage deletions")?;
        index.write().context("Failed to write index")?;
        Ok(())
    }

    /// Paths with unresolved merge conflicts in the index.
    pub fn conflicted_paths(&self) -> Result<Vec<String>> {
        let index = self.repo.index().context("Failed to read index")?;
        if !index.has_conflicts() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for conflict in index.conflicts().context("Failed to read index conflicts")? {
            let conflict = conflict.context("Failed to read index conflict")?;
            if let Some(entry) = conflict.our.or(conflict.their).or(conflict.ancestor) {
                paths.push(String::from_utf8_lossy(&entry.path).to_string());
            }
        }

        Ok(paths)
    }

    /// Name of the branch HEAD points at.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.repo.head().context("Failed to get HEAD reference")?;
        if !head.is_branch() {
            bail!("HEAD is detached; check out a branch first");
        }

        head.shorthand()
            .map(str::to_string)
            .context("Branch name is not valid UTF-8")
    }

    /// Pushes the current branch to the same-named branch on `remote_name`
    /// and returns the branch name.
    ///
    /// Credentials come from the SSH agent or the configured git credential
    /// helper.
    pub fn push_current_branch(&self, remote_name: &str) -> Result<String> {
        let branch = self.current_branch()?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");

        let mut remote = self
            .repo
            .find_remote(remote_name)
            .with_context(|| format!("Remote '{remote_name}' not found"))?;
        let config = self.repo.config().context("Failed to read git config")?;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                Cred::ssh_key_from_agent(username.unwrap_or("git"))
            } else if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                Cred::credential_helper(&config, url, username)
            } else {
                Cred::default()
            }
        });
        callbacks.push_update_reference(|refname, status| match status {
            Some(message) => Err(git2::Error::from_str(&format!(
                "{refname} was rejected: {message}"
            ))),
            None => Ok(()),
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        debug!(remote = %remote_name, %refspec, "Pushing branch");
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .with_context(|| format!("Failed to push {branch} to {remote_name}"))?;
        info!(remote = %remote_name, branch = %branch, "Pushed branch");

        Ok(branch)
    }

    /// Creates a commit from the current index on HEAD.
    pub fn commit_staged(&self, message: &str) -> Result<String> {
        let signature = self
            .repo
            .signature()
            .context("Failed to determine commit author (set user.name and user.email)")?;

        let mut index = self.repo.index().context("Failed to read index")?;
        let tree_id = index.write_tree().context("Failed to write tree")?;
        let tree = self.repo.find_tree(tree_id).context("Failed to find tree")?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit().context("Failed to peel HEAD")?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e).context("Failed to get HEAD reference"),
        };
        let parents: Vec<&Commit> = parent.iter().collect();

        let oid: Oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .context("Failed to create commit")?;

        Ok(oid.to_string())
    }
}

/// Turns a diff into one [`ChangedFile`] per delta.
///
/// Deltas with no textual patch are skipped with a warning.
fn collect_changed_files(diff: &Diff<'_>) -> Result<Vec<ChangedFile>> {
    let mut files = Vec::new();

    for idx in 0..diff.deltas().len() {
        let Some(delta) = diff.get_delta(idx) else {
            continue;
        };
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        let patch = git2::Patch::from_diff(diff, idx)
            .with_context(|| format!("Failed to build patch for {path}"))?;
        let text = match patch {
            Some(mut patch) => {
                let buf = patch
                    .to_buf()
                    .with_context(|| format!("Failed to render patch for {path}"))?;
                String::from_utf8_lossy(&buf).to_string()
            }
            None => String::new(),
        };

        if text.trim().is_empty() {
            warn!(file = %path, "No differences found for file");
            continue;
        }

        debug!(file = %path, diff_len = text.len(), "Collected file diff");
        files.push(ChangedFile {
            filename: path,
            diff: text,
            status: FileStatus::from_delta(delta.status()),
        });
    }

    Ok(files)
}

fn summarize_commit(commit: &Commit<'_>) -> Result<CommitSummary> {
    let hash = commit.id().to_string();
    let short_hash = hash.chars().take(SHORT_HASH_LEN).collect();

    let when = commit.author().when();
    let offset = FixedOffset::east_opt(when.offset_minutes() * 60)
        .or_else(|| FixedOffset::east_opt(0))
        .context("Invalid commit timezone offset")?;
    let date = DateTime::from_timestamp(when.seconds(), 0)
        .context("Invalid commit timestamp")?
        .with_timezone(&offset);

    let subject = truncate_subject(commit.summary().unwrap_or(""), SUBJECT_DISPLAY_LEN);

    Ok(CommitSummary {
        hash,
        short_hash,
        date,
        subject,
    })
}

/// Collapses line breaks and truncates to `max_len` characters with `...`.
pub(crate) fn truncate_subject(subject: &str, max_len: usize) -> String {
    let single_line = subject.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= max_len {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_len.saturating_sub(3)).collect();
    format!("{kept}...")
}
