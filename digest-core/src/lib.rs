//! Core types for the feed digest pipeline
//!
//! This crate defines the shared data structures used across the workspace:
//! feed items as parsed from sources, cached items as persisted by the cache
//! store, and the transient result of a generation call.

pub mod error;
pub mod item;
pub mod summary;

pub use error::{DigestError, DigestResult, ErrorClass};
pub use item::{CachedItem, FeedItem, SourceFeed};
pub use summary::{
    is_error_summary, redact_text, GenerationResult, ERROR_PREFIX_SUMMARY_FAILED, LIST_LIMIT,
    REDACTED, SUMMARY_EMPTY_PLACEHOLDER,
};
