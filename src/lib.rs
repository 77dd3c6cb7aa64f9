//! # acr
//!
//! AI-assisted code review for git repositories.
//!
//! Diffs from commits or the index are reduced to a context that fits the
//! model's window: small diffs are kept verbatim, large ones are chunked and
//! summarized, and summaries are cached on disk by content hash.
//!
//! ## Quick Start
//!
//! ```rust
//! use acr::context::{chunk_text, hash_content};
//!
//! let chunks = chunk_text("abcdef", 4).unwrap();
//! assert_eq!(chunks, vec!["abcd", "ef"]);
//! assert_eq!(hash_content("").len(), 64);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod ai;
pub mod cli;
pub mod config;
pub mod context;
pub mod git;
pub mod utils;

pub use crate::cli::Cli;

/// The current version of acr.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
