//! # Media Dedupe
//!
//! A media library deduplicator that finds duplicate releases, ranks every
//! copy by quality, and explains both the match and the ranking.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - Report duplicates; removal stays a human decision
//! - **Show WHY** - Every group names its match evidence, every score its parts
//! - **Deterministic** - The same library always produces the same report
//!
//! ## Architecture
//! The library is split into a core engine (interface-agnostic) and
//! presentation layers:
//! - `core` - The deduplication engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Stage-specific error types
//!
//! The `media-dedupe` binary adds the command-line front end.

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{MediaDedupeError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
