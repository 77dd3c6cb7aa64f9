//! Diff-to-context reduction.
//!
//! Turns a list of changed files into a prompt body bounded by the model's
//! context window. Small diffs pass through untouched; oversized ones are
//! chunked and summarized, and the summaries are cached on disk keyed by file
//! name and content hash.

pub mod budget;
pub mod builder;
pub mod cache;
pub mod chunk;
pub mod error;
pub mod hash;
pub mod summarizer;

pub use budget::{Budget, BudgetCalculator, DEFAULT_CHARS_PER_TOKEN, DEFAULT_INPUT_SHARE};
pub use builder::{ContextBuilder, ContextOptions, ContextReport, DEFAULT_CONCURRENCY};
pub use cache::{CacheBackend, CacheEntry, CacheStore, ContextCache, DiskCache, MemoryCache};
pub use chunk::chunk_text;
pub use error::ContextError;
pub use hash::{cache_key, hash_content};
pub use summarizer::Summarizer;
