//! Subscription-fetch annotation.
//!
//! # Data Flow
//! ```text
//! GET /sub/{key}
//!     → middleware.rs (runs around every route)
//!     → matcher (subscription grammar; no match = untouched response)
//!     → ClientDirectory lookup (missing record = expire 0)
//!     → annotator.rs (record + user agent → header set)
//!     → headers written onto whatever response the route produced
//! ```
//!
//! # Design Decisions
//! - Header-only: never produces a body or changes the status
//! - Best-effort: an unknown client still gets the full header set

pub mod annotator;
pub mod middleware;

pub use annotator::{subscription_headers, ClientFamily, HeaderAnnotator, SubscriptionHeaders};
pub use middleware::annotate_subscription;
