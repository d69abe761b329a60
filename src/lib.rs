//! Subscription gateway.
//!
//! Resolves client identifiers from request paths against an external,
//! read-only client table and either annotates subscription responses with
//! metadata headers or routes import links to install/redirect pages.

pub mod config;
pub mod http;
pub mod import;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;
pub mod subscription;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
