//! Log command: lists recent commits.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use termcolor::{Color, WriteColor};

use crate::cli::output;
use crate::git::{CommitSummary, GitRepository};

/// Log command options.
#[derive(Parser)]
pub struct LogCommand {
    /// Number of commits to skip from HEAD.
    #[arg(long, default_value = "0")]
    pub skip: usize,

    /// Maximum number of commits to list.
    #[arg(long, short = 'n', default_value = "15")]
    pub limit: usize,
}

impl LogCommand {
    /// Executes the log command.
    pub fn execute(self) -> Result<()> {
        crate::utils::check_git_repository()?;
        let repo = GitRepository::open().context("Failed to open git repository")?;

        let commits = repo.recent_commits(self.skip, self.limit)?;
        if commits.is_empty() {
            println!("✨ No commits found");
            return Ok(());
        }

        let mut out = output::stdout();
        for commit in &commits {
            write_commit_line(&mut out, commit)?;
        }
        Ok(())
    }
}

fn write_commit_line(out: &mut impl WriteColor, commit: &CommitSummary) -> Result<()> {
    output::write_colored(out, Color::Yellow, false, &commit.short_hash)?;
    write!(out, " ")?;
    output::write_colored(
        out,
        Color::Green,
        false,
        &commit.date.format("%Y-%m-%d %H:%M").to_string(),
    )?;
    writeln!(out, " {}", commit.subject)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use termcolor::NoColor;

    #[test]
    fn commit_line_layout() {
        let commit = CommitSummary {
            hash: "0123456789abcdef".to_string(),
            short_hash: "01234567".to_string(),
            date: DateTime::parse_from_rfc3339("2024-05-01T09:30:00+02:00").unwrap(),
            subject: "Add parser".to_string(),
        };
        let mut buf = NoColor::new(Vec::new());
        write_commit_line(&mut buf, &commit).unwrap();
        assert_eq!(
            String::from_utf8(buf.into_inner()).unwrap(),
            "01234567 2024-05-01 09:30 Add parser\n"
        );
    }

    #[test]
    fn defaults() {
        let cmd = LogCommand::try_parse_from(["log"]).unwrap();
        assert_eq!(cmd.skip, 0);
        assert_eq!(cmd.limit, 15);
    }
}
