//! Import links: `/i/{key}[/{platform}]`.
//!
//! # Data Flow
//! ```text
//! GET /i/{key}[/{platform}]
//!     → router.rs (grammar → client lookup → platform dispatch)
//!     → pages.rs (menu / iOS / Android / Happ fallback markup)
//!     → ImportResponse (404 text, 302 Location, or 200 HTML)
//! ```
//!
//! # Design Decisions
//! - Dispatch is exhaustive over the closed `Platform` enum
//! - Pages are pure functions of the subscription URL, host and alias
//! - A missing Happ link degrades to the generator page, never an error

pub mod pages;
pub mod router;

pub use router::{ImportResponse, ImportRouter, NOT_FOUND, UNKNOWN_ALIAS};
