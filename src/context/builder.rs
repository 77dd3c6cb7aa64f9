//! Reduces a list of changed files to a prompt body that fits the model.
//!
//! Each file ends up in exactly one of four states:
//!
//! - **cache hit**: a summary stored for the same file and diff is reused
//! - **pass-through**: the diff fits the chunk budget and is kept verbatim
//! - **summarized**: the diff is chunked, each chunk summarized in order, the
//!   summaries joined and, if still too long, summarized once more
//! - **fallback**: any failure on the way keeps the original diff
//!
//! The output always has the same length and order as the input.

use anyhow::Result;
use futures::future::join_all;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::ai::prompts::{chunk_summary_prompt, combine_summary_prompt};
use crate::ai::PromptType;
use crate::context::budget::BudgetCalculator;
use crate::context::cache::{CacheEntry, CacheStore, ContextCache};
use crate::context::chunk::chunk_text;
use crate::context::hash::cache_key;
use crate::context::summarizer::Summarizer;
use crate::context::ContextError;
use crate::git::ChangedFile;

/// Files processed at the same time unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Separator placed between chunk summaries.
pub const SUMMARY_SEPARATOR: &str = "\n\n";

/// Wraps a summary reused from the cache.
pub fn cached_marker(summary: &str) -> String {
    format!("/* SUMMARY (cached): {summary} */\n")
}

/// Wraps a summary produced during this run.
pub fn fresh_marker(summary: &str) -> String {
    format!("/* SUMMARY:\n{summary}\n*/\n")
}

/// Tuning for a single [`ContextBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Fixed chunk size; computed from the model when `None`.
    pub max_chars_per_chunk: Option<usize>,
    /// Joined-summary length that triggers a second pass; defaults to the
    /// chunk size.
    pub max_combined_chars: Option<usize>,
    /// Maximum files summarized at once.
    pub concurrency: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_chars_per_chunk: None,
            max_combined_chars: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Per-outcome counts for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextReport {
    /// Files served from the cache.
    pub cache_hits: usize,
    /// Files small enough to keep verbatim.
    pub passed_through: usize,
    /// Files summarized during this run.
    pub summarized: usize,
    /// Files that kept their original diff after a failure.
    pub fallbacks: usize,
}

impl ContextReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::CacheHit => self.cache_hits += 1,
            FileOutcome::PassThrough => self.passed_through += 1,
            FileOutcome::Summarized => self.summarized += 1,
            FileOutcome::Fallback => self.fallbacks += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    CacheHit,
    PassThrough,
    Summarized,
    Fallback,
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    max_chars_per_chunk: usize,
    max_combined_chars: usize,
}

/// Orchestrates hashing, caching, chunking and summarization.
pub struct ContextBuilder {
    summarizer: Summarizer,
    cache: ContextCache,
    budget: BudgetCalculator,
    options: ContextOptions,
}

impl ContextBuilder {
    /// Builder with default budget and options.
    pub fn new(summarizer: Summarizer, cache: ContextCache) -> Self {
        Self {
            summarizer,
            cache,
            budget: BudgetCalculator::default(),
            options: ContextOptions::default(),
        }
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: ContextOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the budget calculator.
    #[must_use]
    pub fn with_budget(mut self, budget: BudgetCalculator) -> Self {
        self.budget = budget;
        self
    }

    /// The summarizer, for issuing the final completion request.
    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    /// The summary cache.
    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Reduces `files` to fit the model. See the module docs for the rules.
    pub async fn build_context(
        &self,
        files: &[ChangedFile],
        prompt_type: PromptType,
    ) -> Result<Vec<ChangedFile>, ContextError> {
        let (files, _) = self.build_context_with_report(files, prompt_type).await?;
        Ok(files)
    }

    /// Like [`build_context`](Self::build_context), also returning outcome counts.
    pub async fn build_context_with_report(
        &self,
        files: &[ChangedFile],
        prompt_type: PromptType,
    ) -> Result<(Vec<ChangedFile>, ContextReport), ContextError> {
        let limits = self.resolve_limits()?;
        if self.options.concurrency == 0 {
            return Err(ContextError::invalid("concurrency must be greater than zero"));
        }

        debug!(
            %prompt_type,
            file_count = files.len(),
            max_chars_per_chunk = limits.max_chars_per_chunk,
            max_combined_chars = limits.max_combined_chars,
            concurrency = self.options.concurrency,
            "Building context"
        );

        let store = Mutex::new(self.cache.read());
        let semaphore = Semaphore::new(self.options.concurrency);

        let futs = files.iter().map(|file| {
            let store = &store;
            let semaphore = &semaphore;
            async move {
                // Never closed, so an error only means no permit to hold.
                let _permit = semaphore.acquire().await.ok();
                self.process_file(file, store, limits).await
            }
        });
        let results = join_all(futs).await;

        let mut report = ContextReport::default();
        let mut output = Vec::with_capacity(results.len());
        for (file, outcome) in results {
            report.record(outcome);
            output.push(file);
        }

        info!(
            cache_hits = report.cache_hits,
            passed_through = report.passed_through,
            summarized = report.summarized,
            fallbacks = report.fallbacks,
            "Context built"
        );

        Ok((output, report))
    }

    fn resolve_limits(&self) -> Result<Limits, ContextError> {
        let max_chars_per_chunk = match self.options.max_chars_per_chunk {
            Some(0) => {
                return Err(ContextError::invalid(
                    "max_chars_per_chunk must be greater than zero",
                ))
            }
            Some(chars) => chars,
            None => self.budget.compute_max_chunk_chars(&self.summarizer.model()),
        };

        let max_combined_chars = match self.options.max_combined_chars {
            Some(0) => {
                return Err(ContextError::invalid(
                    "max_combined_chars must be greater than zero",
                ))
            }
            Some(chars) => chars,
            None => max_chars_per_chunk,
        };

        Ok(Limits {
            max_chars_per_chunk,
            max_combined_chars,
        })
    }

    async fn process_file(
        &self,
        file: &ChangedFile,
        store: &Mutex<CacheStore>,
        limits: Limits,
    ) -> (ChangedFile, FileOutcome) {
        let key = cache_key(&file.filename, &file.diff);
        let language = self.summarizer.language();

        if let Some(entry) = store.lock().await.get(&key) {
            if entry.matches_language(language) {
                debug!(file = %file.filename, "Using cached summary");
                return (
                    file.with_diff(cached_marker(&entry.summary)),
                    FileOutcome::CacheHit,
                );
            }
            debug!(
                file = %file.filename,
                cached_language = entry.language.as_deref().unwrap_or_default(),
                "Cached summary is for another language"
            );
        }

        let diff_len = file.diff.chars().count();
        if diff_len <= limits.max_chars_per_chunk {
            debug!(file = %file.filename, diff_len, "Diff fits budget; keeping it verbatim");
            return (file.clone(), FileOutcome::PassThrough);
        }

        match self.summarize_diff(file, limits).await {
            Ok(summary) => {
                let mut guard = store.lock().await;
                guard.insert(key, CacheEntry::new(summary.clone(), language));
                self.cache.write(&guard);
                drop(guard);

                (file.with_diff(fresh_marker(&summary)), FileOutcome::Summarized)
            }
            Err(e) => {
                warn!(
                    file = %file.filename,
                    error = %e,
                    "Failed to summarize diff; using the original"
                );
                (file.clone(), FileOutcome::Fallback)
            }
        }
    }

    async fn summarize_diff(&self, file: &ChangedFile, limits: Limits) -> Result<String> {
        let chunks = chunk_text(&file.diff, limits.max_chars_per_chunk)?;
        info!(
            file = %file.filename,
            chunk_count = chunks.len(),
            "Summarizing oversized diff"
        );

        let mut summaries = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            debug!(file = %file.filename, chunk = index + 1, "Summarizing chunk");
            summaries.push(self.summarizer.summarize(&chunk_summary_prompt(chunk)).await?);
        }

        let combined = summaries.join(SUMMARY_SEPARATOR);
        if combined.chars().count() <= limits.max_combined_chars {
            return Ok(combined);
        }

        debug!(
            file = %file.filename,
            combined_len = combined.chars().count(),
            "Combined summary too long; compressing"
        );
        self.summarizer
            .summarize(&combine_summary_prompt(&combined))
            .await
    }
}
