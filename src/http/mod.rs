//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span)
//!     → /i/...     → import router
//!     → /sub/...   → upstream body + subscription header middleware
//!     → /healthz   → health.rs
//!     → Send to client
//! ```

pub mod health;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
