//! Import link dispatch.
//!
//! # States
//! ```text
//! path ──grammar──▶ {key, platform} ──lookup──▶ record ──▶ sub_url ──platform──▶ response
//!   │ no match              │ unknown
//!   ▼                       ▼
//! 404 "Not found"     404 "Unknown alias"
//! ```
//!
//! Every request takes exactly one path through the machine; the only I/O
//! is the cached table reads.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::config::ImportConfig;
use crate::import::pages::{self, MobilePlatform, PageParams};
use crate::observability::metrics;
use crate::routing::{match_import, Platform};
use crate::store::{ClientDirectory, ClientRecord, LinkDirectory};

pub const NOT_FOUND: &str = "Not found";
pub const UNKNOWN_ALIAS: &str = "Unknown alias";

/// Result of routing one import request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResponse {
    /// 404 with a short plain-text body.
    NotFound(&'static str),
    /// 302 to the given location.
    Redirect(String),
    /// 200 HTML page.
    Html(String),
}

impl ImportResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            ImportResponse::NotFound(_) => StatusCode::NOT_FOUND,
            ImportResponse::Redirect(_) => StatusCode::FOUND,
            ImportResponse::Html(_) => StatusCode::OK,
        }
    }
}

impl IntoResponse for ImportResponse {
    fn into_response(self) -> Response {
        match self {
            ImportResponse::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            ImportResponse::Redirect(location) => match HeaderValue::from_bytes(location.as_bytes()) {
                Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)], Body::empty())
                    .into_response(),
                Err(_) => {
                    tracing::warn!(location = %location, "Redirect target is not a valid header value");
                    (StatusCode::NOT_FOUND, NOT_FOUND).into_response()
                }
            },
            ImportResponse::Html(html) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                html,
            )
                .into_response(),
        }
    }
}

/// Resolves `/i/{key}[/{platform}]` requests.
pub struct ImportRouter {
    clients: Arc<ClientDirectory>,
    links: Arc<LinkDirectory>,
    config: ImportConfig,
}

impl ImportRouter {
    pub fn new(clients: Arc<ClientDirectory>, links: Arc<LinkDirectory>, config: ImportConfig) -> Self {
        Self { clients, links, config }
    }

    /// Route one request. `host` is the inbound Host header, if any.
    pub fn route(&self, path: &str, host: Option<&str>) -> ImportResponse {
        let Some(import) = match_import(path) else {
            metrics::record_import("bad_path");
            return ImportResponse::NotFound(NOT_FOUND);
        };

        let Some(record) = self.clients.lookup(import.key) else {
            tracing::debug!(key = %import.key, "Import key has no client record");
            metrics::record_import("unknown_alias");
            return ImportResponse::NotFound(UNKNOWN_ALIAS);
        };

        let host = host
            .filter(|h| !h.is_empty())
            .unwrap_or(&self.config.fallback_host);
        let sub_url = format!("https://{}/sub/{}", host, record.name);
        let params = PageParams {
            sub_url: &sub_url,
            host,
            alias: &record.name,
        };

        metrics::record_import(import.platform.as_str());
        tracing::debug!(client = %record.name, platform = %import.platform, "Import dispatch");

        match import.platform {
            Platform::Menu => ImportResponse::Html(pages::menu_page(&params, &self.config)),
            Platform::Ios => {
                ImportResponse::Html(pages::mobile_page(MobilePlatform::Ios, &params, &self.config))
            }
            Platform::Android => ImportResponse::Html(pages::mobile_page(
                MobilePlatform::Android,
                &params,
                &self.config,
            )),
            Platform::Happ => self.happ(&record, &params),
            Platform::Mac => ImportResponse::Redirect(pages::deep_link(
                &self.config.deep_link_scheme,
                &sub_url,
            )),
            Platform::Sub => ImportResponse::Redirect(sub_url.clone()),
        }
    }

    /// Redirect to the stored Happ link, or fall back to the generator page.
    fn happ(&self, record: &ClientRecord, params: &PageParams<'_>) -> ImportResponse {
        match self.links.resolve(Some(record)) {
            Some(link) => ImportResponse::Redirect(link),
            None => {
                tracing::debug!(client = %record.name, "No Happ link on file, serving generator page");
                ImportResponse::Html(pages::happ_fallback_page(params, &self.config))
            }
        }
    }
}
