//! Analyze command: AI code review of commits or staged changes.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use termcolor::Color;

use crate::ai::PromptType;
use crate::cli::{output, pipeline};
use crate::config::AppConfig;
use crate::git::{GitRepository, SHORT_HASH_LEN};

/// Analyze command options.
#[derive(Parser)]
pub struct AnalyzeCommand {
    /// Commits to review (hashes or refs). Defaults to HEAD.
    #[arg(value_name = "COMMIT")]
    pub commits: Vec<String>,

    /// Reviews the staged changes instead of commits.
    #[arg(long, conflicts_with = "commits")]
    pub staged: bool,

    /// Model to use (if not specified, uses settings or default).
    #[arg(long)]
    pub model: Option<String>,

    /// Fixed chunk size in characters, overriding the model-derived budget.
    #[arg(long, value_name = "CHARS")]
    pub max_chunk_chars: Option<usize>,

    /// Maximum number of files summarized at once.
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl AnalyzeCommand {
    /// Executes the analyze command.
    pub async fn execute(self) -> Result<()> {
        let mut config = AppConfig::load()?;
        apply_overrides(&mut config, self.model, self.max_chunk_chars, self.concurrency);
        let info = crate::utils::check_ai_command_prerequisites(&config)?;

        let repo = GitRepository::open()
            .context("Failed to open git repository. Make sure you're in a git repository.")?;
        let mut out = output::stdout();

        if self.staged {
            let files = repo.staged_changed_files()?;
            if files.is_empty() {
                println!("✨ No staged changes to analyze");
                return Ok(());
            }

            println!("🔍 Analyzing {} staged file(s) with {}...", files.len(), info.provider);
            let review =
                pipeline::generate_with_auth_retry(&mut config, &files, PromptType::Analyze).await?;
            output::heading(&mut out, "Staged changes")?;
            writeln!(out, "{review}")?;
            return Ok(());
        }

        let commits = if self.commits.is_empty() {
            vec!["HEAD".to_string()]
        } else {
            self.commits
        };

        for rev in &commits {
            let hash = repo.resolve_commit(rev)?;
            let short: String = hash.chars().take(SHORT_HASH_LEN).collect();
            let files = repo.commit_changed_files(&hash)?;
            if files.is_empty() {
                println!("✨ Commit {short} has no textual changes; skipping");
                continue;
            }

            println!(
                "🔍 Analyzing commit {short} ({} file(s)) with {}...",
                files.len(),
                info.provider
            );
            let review =
                pipeline::generate_with_auth_retry(&mut config, &files, PromptType::Analyze).await?;

            write!(out, "\n📝 Review of commit ")?;
            output::write_colored(&mut out, Color::Yellow, true, &short)?;
            writeln!(out, "\n")?;
            writeln!(out, "{review}")?;
        }

        Ok(())
    }
}

/// Applies command-line overrides on top of the loaded configuration.
pub(crate) fn apply_overrides(
    config: &mut AppConfig,
    model: Option<String>,
    max_chunk_chars: Option<usize>,
    concurrency: Option<usize>,
) {
    if let Some(model) = model {
        config.model = model;
    }
    if let Some(chars) = max_chunk_chars.filter(|&n| n > 0) {
        config.max_chunk_chars = Some(chars);
    }
    if let Some(n) = concurrency.filter(|&n| n > 0) {
        config.concurrency = n;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_configured_values() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, Some("gpt-4o".to_string()), Some(900), Some(2));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_chunk_chars, Some(900));
        assert_eq!(config.concurrency, 2);
    }

    #[test]
    fn zero_overrides_are_ignored() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, None, Some(0), Some(0));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn parses_commits_and_flags() {
        let cmd = AnalyzeCommand::try_parse_from([
            "analyze",
            "abc123",
            "HEAD~1",
            "--max-chunk-chars",
            "4000",
        ])
        .unwrap();
        assert_eq!(cmd.commits, vec!["abc123", "HEAD~1"]);
        assert_eq!(cmd.max_chunk_chars, Some(4000));
        assert!(!cmd.staged);
    }

    #[test]
    fn staged_conflicts_with_commits() {
        assert!(AnalyzeCommand::try_parse_from(["analyze", "--staged", "HEAD"]).is_err());
        assert!(AnalyzeCommand::try_parse_from(["analyze", "--staged"]).is_ok());
    }
}
