//! Process lifecycle: start, serve, stop.
//!
//! # Data Flow
//! ```text
//! startup.rs:   config → metrics exporter → HttpServer → bind → serve
//! signals.rs:   Ctrl-C / SIGTERM → Shutdown::trigger
//! shutdown.rs:  one broadcast → axum stops accepting → in-flight requests drain
//! ```
//!
//! # Design Decisions
//! - A startup error is fatal and returned from `main`
//! - The server and its tables are built before the listener binds
//! - Shutdown fires once; later triggers are ignored

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
