//! Metadata headers for subscription responses.

use std::sync::Arc;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::SubscriptionConfig;
use crate::routing::match_subscription;
use crate::store::{ClientDirectory, ClientRecord};

pub const PROFILE_UPDATE_INTERVAL: HeaderName = HeaderName::from_static("profile-update-interval");
pub const PROFILE_TITLE: HeaderName = HeaderName::from_static("profile-title");
pub const ANNOUNCE: HeaderName = HeaderName::from_static("announce");
pub const ANNOUNCE_URL: HeaderName = HeaderName::from_static("announce-url");
pub const SUPPORT_URL: HeaderName = HeaderName::from_static("support-url");
pub const PROFILE_WEB_PAGE_URL: HeaderName = HeaderName::from_static("profile-web-page-url");
pub const SUBSCRIPTION_USERINFO: HeaderName = HeaderName::from_static("subscription-userinfo");

/// Client app family, detected from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientFamily {
    Happ,
    V2Ray,
    Other,
}

impl ClientFamily {
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        if ua.contains("happ") {
            ClientFamily::Happ
        } else if ua.contains("v2raytun") || ua.contains("v2ray") {
            ClientFamily::V2Ray
        } else {
            ClientFamily::Other
        }
    }
}

/// Announcement for a client family. Every family currently gets the
/// configured text.
fn announcement(family: ClientFamily, config: &SubscriptionConfig) -> &str {
    match family {
        ClientFamily::Happ => &config.announce,
        ClientFamily::V2Ray => &config.announce,
        ClientFamily::Other => &config.announce,
    }
}

/// An ordered set of response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHeaders {
    entries: Vec<(HeaderName, String)>,
}

impl SubscriptionHeaders {
    pub fn get(&self, name: &HeaderName) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &str)> {
        self.entries.iter().map(|(n, v)| (n, v.as_str()))
    }

    /// Write every header, replacing existing values. Values that are not
    /// legal header bytes are skipped.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.entries {
            match HeaderValue::from_bytes(value.as_bytes()) {
                Ok(v) => {
                    headers.insert(name.clone(), v);
                }
                Err(_) => {
                    tracing::warn!(header = %name, "Skipping header with invalid value");
                }
            }
        }
    }
}

/// Build the header set for a (possibly unknown) client.
pub fn subscription_headers(
    record: Option<&ClientRecord>,
    user_agent: &str,
    config: &SubscriptionConfig,
) -> SubscriptionHeaders {
    let expire = record.map(|r| r.expire).unwrap_or(0);
    let family = ClientFamily::detect(user_agent);

    SubscriptionHeaders {
        entries: vec![
            (PROFILE_UPDATE_INTERVAL, config.update_interval_hours.to_string()),
            (PROFILE_TITLE, config.profile_title.clone()),
            (ANNOUNCE, announcement(family, config).to_string()),
            (ANNOUNCE_URL, config.announce_url.clone()),
            (SUPPORT_URL, config.support_url.clone()),
            (PROFILE_WEB_PAGE_URL, config.web_page_url.clone()),
            (
                SUBSCRIPTION_USERINFO,
                format!("upload=0; download=0; total=0; expire={expire}"),
            ),
        ],
    }
}

/// Resolves subscription paths to header sets.
pub struct HeaderAnnotator {
    clients: Arc<ClientDirectory>,
    config: SubscriptionConfig,
}

impl HeaderAnnotator {
    pub fn new(clients: Arc<ClientDirectory>, config: SubscriptionConfig) -> Self {
        Self { clients, config }
    }

    /// Headers for `path`, or `None` if it is not a subscription path.
    pub fn annotate(&self, path: &str, user_agent: &str) -> Option<SubscriptionHeaders> {
        let matched = match_subscription(path)?;
        let record = self.clients.lookup(matched.key);
        if record.is_none() {
            tracing::debug!(key = %matched.key, "Subscription key has no client record");
        }
        Some(subscription_headers(record.as_ref(), user_agent, &self.config))
    }
}
