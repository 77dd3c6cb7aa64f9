//! Create command: generates a commit message for the staged changes.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::ai::PromptType;
use crate::cli::analyze::apply_overrides;
use crate::cli::{output, pipeline};
use crate::config::AppConfig;
use crate::git::{GitRepository, SHORT_HASH_LEN};

/// Create command options.
#[derive(Parser)]
pub struct CreateCommand {
    /// Stages every change in the working tree first.
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Commits the staged changes with the generated message.
    #[arg(long)]
    pub commit: bool,

    /// Opens the generated message in `$ACR_EDITOR` or `$EDITOR` first.
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Continues even when the index has unresolved conflicts.
    #[arg(long)]
    pub force: bool,

    /// Pushes the current branch after committing.
    #[arg(long, requires = "commit")]
    pub push: bool,

    /// Remote to push to with `--push`.
    #[arg(long, default_value = "origin")]
    pub remote: String,

    /// Model to use (if not specified, uses settings or default).
    #[arg(long)]
    pub model: Option<String>,
}

impl CreateCommand {
    /// Executes the create command.
    pub async fn execute(self) -> Result<()> {
        let mut config = AppConfig::load()?;
        apply_overrides(&mut config, self.model, None, None);
        crate::utils::check_ai_command_prerequisites(&config)?;

        let repo = GitRepository::open()
            .context("Failed to open git repository. Make sure you're in a git repository.")?;

        check_conflicts(&repo.conflicted_paths()?, self.force)?;

        if self.all {
            repo.stage_all()?;
            println!("➕ Staged all changes");
        }

        let files = repo.staged_changed_files()?;
        if files.is_empty() {
            bail!("No staged changes found. Stage files with `git add` or pass --all.");
        }

        println!("✍️  Generating commit message for {} file(s)...", files.len());
        let raw =
            pipeline::generate_with_auth_retry(&mut config, &files, PromptType::Create).await?;
        let mut message = normalize_message(&raw);
        if message.is_empty() {
            bail!("The model returned an empty commit message");
        }
        if self.edit {
            message = edit_message(&resolve_editor(|key| env::var(key).ok()), &message)?;
        }

        let mut out = output::stdout();
        output::heading(&mut out, "\nCommit message")?;
        println!("{message}\n");

        if self.commit {
            let hash = repo.commit_staged(&message)?;
            let short: String = hash.chars().take(SHORT_HASH_LEN).collect();
            println!("✅ Created commit {short}");

            if self.push {
                let branch = repo.push_current_branch(&self.remote)?;
                println!("🚀 Pushed {branch} to {}", self.remote);
            }
        } else {
            println!("💡 Run again with --commit to commit with this message");
        }

        Ok(())
    }
}

/// Editor used when neither `ACR_EDITOR` nor `EDITOR` is set.
const FALLBACK_EDITOR: &str = "vi";

/// Lists conflicted paths and fails unless `force` is set.
fn check_conflicts(paths: &[String], force: bool) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    eprintln!("❌ Conflicts detected in the following files:");
    for (index, path) in paths.iter().enumerate() {
        eprintln!("{}. {path}", index + 1);
    }
    if !force {
        bail!("Resolve the conflicts before committing, or pass --force to continue anyway");
    }
    eprintln!("⚠️  Continuing with conflicts");
    Ok(())
}

fn resolve_editor(lookup: impl Fn(&str) -> Option<String>) -> String {
    ["ACR_EDITOR", "EDITOR"]
        .into_iter()
        .filter_map(lookup)
        .map(|editor| editor.trim().to_string())
        .find(|editor| !editor.is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

/// Lets the user revise `message` in `editor` and returns the result.
///
/// The editor string may carry arguments (`code --wait`). An empty result
/// aborts the commit.
pub(crate) fn edit_message(editor: &str, message: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("acr-commit-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create commit message file")?;
    file.write_all(message.as_bytes())
        .and_then(|()| file.flush())
        .context("Failed to write commit message file")?;

    let mut parts = editor.split_whitespace();
    let command = parts.next().unwrap_or(editor);
    println!("📝 Opening commit message in editor: {editor}");
    let status = Command::new(command)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to execute editor '{editor}'"))?;
    if !status.success() {
        bail!("Editor exited with non-zero status: {:?}", status.code());
    }

    let edited = fs::read_to_string(file.path()).context("Failed to read edited message")?;
    let edited = edited.trim().to_string();
    if edited.is_empty() {
        bail!("The commit message is empty");
    }
    Ok(edited)
}

/// Strips code fences and surrounding whitespace the model may add.
pub(crate) fn normalize_message(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, |inner| {
            // Drop an info string such as ```text
            inner.split_once('\n').map_or(inner, |(_, body)| body)
        });
    unfenced.trim().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_is_trimmed() {
        assert_eq!(
            normalize_message("\n✨ Add parser\n\n- Handles input\n"),
            "✨ Add parser\n\n- Handles input"
        );
    }

    #[test]
    fn fenced_message_is_unwrapped() {
        assert_eq!(
            normalize_message("```text\n🐛 Fix crash\n\nBody\n```"),
            "🐛 Fix crash\n\nBody"
        );
        assert_eq!(normalize_message("```\nTitle\n```"), "Title");
    }

    #[test]
    fn parses_flags() {
        let cmd = CreateCommand::try_parse_from(["create", "-a", "--commit"]).unwrap();
        assert!(cmd.all);
        assert!(cmd.commit);
        assert!(!cmd.edit);
        assert!(!cmd.push);
        assert_eq!(cmd.remote, "origin");
        assert!(cmd.model.is_none());
    }

    #[test]
    fn push_requires_commit() {
        assert!(CreateCommand::try_parse_from(["create", "--push"]).is_err());

        let cmd = CreateCommand::try_parse_from([
            "create", "--commit", "--push", "--remote", "upstream",
        ])
        .unwrap();
        assert!(cmd.push);
        assert_eq!(cmd.remote, "upstream");
    }

    #[test]
    fn conflicts_abort_unless_forced() {
        assert!(check_conflicts(&[], false).is_ok());

        let paths = vec!["src/lib.rs".to_string()];
        let err = check_conflicts(&paths, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(check_conflicts(&paths, true).is_ok());
    }

    #[test]
    fn editor_resolution_order() {
        let lookup = |pairs: &'static [(&'static str, &'static str)]| {
            move |key: &str| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| (*v).to_string())
            }
        };

        assert_eq!(
            resolve_editor(lookup(&[("ACR_EDITOR", "nano"), ("EDITOR", "vim")])),
            "nano"
        );
        assert_eq!(resolve_editor(lookup(&[("ACR_EDITOR", " "), ("EDITOR", "vim")])), "vim");
        assert_eq!(resolve_editor(lookup(&[])), FALLBACK_EDITOR);
    }

    #[cfg(unix)]
    fn script_editor(dir: &tempfile::TempDir, body: &str) -> String {
        let script = dir.path().join("editor.sh");
        fs::write(&script, body).unwrap();
        format!("sh {}", script.display())
    }

    #[cfg(unix)]
    #[test]
    fn edited_message_is_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let editor = script_editor(&dir, "printf '✨ Edited title\\n\\nBody\\n' > \"$1\"\n");

        let edited = edit_message(&editor, "🐛 Original").unwrap();
        assert_eq!(edited, "✨ Edited title\n\nBody");
    }

    #[cfg(unix)]
    #[test]
    fn untouched_message_is_kept() {
        assert_eq!(edit_message("true", "🐛 Original\n").unwrap(), "🐛 Original");
    }

    #[cfg(unix)]
    #[test]
    fn emptied_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let editor = script_editor(&dir, ": > \"$1\"\n");

        let err = edit_message(&editor, "🐛 Original").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_editor_aborts() {
        assert!(edit_message("false", "🐛 Original").is_err());
    }
}
