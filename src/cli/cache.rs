//! Cache commands: inspect or clear stored diff summaries.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::context::ContextCache;

/// Summary cache operations.
#[derive(Parser)]
pub struct CacheCommand {
    /// Cache subcommand to execute.
    #[command(subcommand)]
    pub command: CacheSubcommands,
}

/// Cache subcommands.
#[derive(Subcommand)]
pub enum CacheSubcommands {
    /// Deletes every stored summary.
    Clear,
    /// Lists stored summaries.
    Show,
}

impl CacheCommand {
    /// Executes the cache command.
    pub fn execute(self) -> Result<()> {
        let cache = ContextCache::disk();
        match self.command {
            CacheSubcommands::Clear => {
                cache.clear();
                println!("🗑️  Cleared summary cache at {}", cache.location());
            }
            CacheSubcommands::Show => print!("{}", describe(&cache)),
        }
        Ok(())
    }
}

fn describe(cache: &ContextCache) -> String {
    let store = cache.read();
    let mut text = format!(
        "📦 {} cached summar{} in {}\n",
        store.len(),
        if store.len() == 1 { "y" } else { "ies" },
        cache.location()
    );

    for (key, entry) in &store {
        let when = chrono::DateTime::from_timestamp_millis(entry.timestamp)
            .map_or_else(|| "unknown time".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        let language = entry.language.as_deref().unwrap_or("-");
        text.push_str(&format!("  {key}  [{language}, {when}]\n"));
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::{CacheEntry, CacheStore};

    #[test]
    fn describe_lists_entries() {
        let cache = ContextCache::in_memory();
        let mut store = CacheStore::new();
        store.insert(
            "src/lib.rs:abcd".to_string(),
            CacheEntry {
                summary: "s".to_string(),
                timestamp: 0,
                language: Some("fr".to_string()),
            },
        );
        cache.write(&store);

        let text = describe(&cache);
        assert!(text.starts_with("📦 1 cached summary in <memory>"));
        assert!(text.contains("  src/lib.rs:abcd  [fr, 1970-01-01 00:00]"));
    }

    #[test]
    fn describe_empty_cache() {
        let text = describe(&ContextCache::in_memory());
        assert!(text.starts_with("📦 0 cached summaries"));
    }
}
