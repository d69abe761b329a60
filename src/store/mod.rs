//! Read-only view of the external client and link tables.
//!
//! # Data Flow
//! ```text
//! clients.json / happ-links.json (owned by the provisioning side)
//!     → source.rs (raw bytes, no parsing policy)
//!     → cache.rs (TTL-bounded snapshot, failures degrade to empty)
//!     → clients.rs (token/name lookup)
//!     → links.rs (per-client redirect link)
//! ```
//!
//! # Design Decisions
//! - One cache per table, owned by its directory; nothing is global
//! - A reload replaces the whole snapshot; readers never see a partial table
//! - Concurrent misses may reload in parallel; last write wins
//! - Store failures never reach request handlers

pub mod cache;
pub mod clients;
pub mod links;
pub mod source;

use thiserror::Error;

pub use cache::{Clock, LoadObserver, ManualClock, MonotonicClock, Snapshot, TracingObserver, TtlCache};
pub use clients::{ClientDirectory, ClientRecord};
pub use links::{LinkDirectory, LinkTable};
pub use source::{FileSource, MemorySource, TableSource};

/// Errors raised while reading or decoding a backing table.
///
/// These are absorbed at the cache boundary and only surface through a
/// [`LoadObserver`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The table could not be read.
    #[error("table read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The table was read but is not the expected JSON shape.
    #[error("table is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}
