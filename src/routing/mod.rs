//! Request path classification.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → matcher.rs (subscription grammar, import grammar)
//!     → SubscriptionPath   → header annotation
//!     → ImportPath         → import dispatch
//!     → no match           → caller decides (no-op or 404)
//! ```
//!
//! # Design Decisions
//! - Matchers are pure functions over `&str`, borrowed results
//! - Deterministic: same path always yields the same match

pub mod matcher;

pub use matcher::{match_import, match_subscription, ImportPath, Platform, SubscriptionPath};
