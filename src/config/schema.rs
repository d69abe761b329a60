//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the subscription gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Backing table locations and cache TTL.
    pub tables: TableConfig,

    /// Subscription-fetch route settings.
    pub subscription: SubscriptionConfig,

    /// Import route settings.
    pub import: ImportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Backing tables. Both are read-only JSON files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TableConfig {
    /// JSON array of `{token, name, expire}` objects.
    pub clients_path: String,

    /// JSON object mapping client name or token to a redirect URL.
    pub links_path: String,

    /// Maximum age of a cached table in milliseconds.
    pub cache_ttl_ms: u64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            clients_path: "/var/lib/vless-sub/clients.json".to_string(),
            links_path: "/var/lib/vless-sub/happ-links.json".to_string(),
            cache_ttl_ms: 5000,
        }
    }
}

/// Headers attached to `/sub/{token}` responses, and the body upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Base URL that serves subscription bodies (e.g., "http://127.0.0.1:2096").
    /// Without it `/sub/` answers 404 but still carries headers.
    pub upstream: Option<String>,

    pub profile_title: String,

    /// Suggested client refresh interval, in hours.
    pub update_interval_hours: u32,

    pub announce: String,
    pub announce_url: String,
    pub support_url: String,
    pub web_page_url: String,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            upstream: None,
            profile_title: "HexenKVN".to_string(),
            update_interval_hours: 24,
            announce: "If the connection stops working, refresh the subscription".to_string(),
            announce_url: "https://example.com/support".to_string(),
            support_url: "https://example.com/support".to_string(),
            web_page_url: "https://example.com/support".to_string(),
        }
    }
}

/// Import landing pages and redirects.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Host used in generated URLs when the request carries none.
    pub fallback_host: String,

    /// Brand shown in page titles.
    pub brand: String,

    /// Support link on the menu page.
    pub support_chat_url: String,

    /// Deep-link scheme of the primary client app; links are
    /// `{scheme}://import/{subscription url}`.
    pub deep_link_scheme: String,

    /// Endpoint that turns a subscription URL into a Happ import link.
    pub happ_generator_url: String,

    /// App store and installer URLs.
    pub stores: StoreLinks,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            fallback_host: "example.com:8443".to_string(),
            brand: "HexenKVN".to_string(),
            support_chat_url: "https://example.com/support".to_string(),
            deep_link_scheme: "v2raytun".to_string(),
            happ_generator_url: "https://crypto.happ.su/".to_string(),
            stores: StoreLinks::default(),
        }
    }
}

/// Where to get each client app, per platform.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreLinks {
    pub v2raytun_android: String,
    pub happ_android: String,
    pub v2raytun_ios: String,
    pub happ_ios: String,
    pub v2raytun_macos: String,
    pub happ_macos: String,
    pub v2raytun_windows: String,
    pub happ_windows: String,
}

impl StoreLinks {
    /// All URLs with their field names, for validation.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("v2raytun_android", self.v2raytun_android.as_str()),
            ("happ_android", self.happ_android.as_str()),
            ("v2raytun_ios", self.v2raytun_ios.as_str()),
            ("happ_ios", self.happ_ios.as_str()),
            ("v2raytun_macos", self.v2raytun_macos.as_str()),
            ("happ_macos", self.happ_macos.as_str()),
            ("v2raytun_windows", self.v2raytun_windows.as_str()),
            ("happ_windows", self.happ_windows.as_str()),
        ]
    }
}

impl Default for StoreLinks {
    fn default() -> Self {
        Self {
            v2raytun_android: "https://play.google.com/store/apps/details?id=com.v2raytun.android".to_string(),
            happ_android: "https://play.google.com/store/apps/details?id=com.happproxy".to_string(),
            v2raytun_ios: "https://apps.apple.com/app/v2raytun/id6476628951".to_string(),
            happ_ios: "https://apps.apple.com/app/happ-proxy-utility-plus/id6746188973".to_string(),
            v2raytun_macos: "https://apps.apple.com/app/v2raytun/id6476628951".to_string(),
            happ_macos: "https://apps.apple.com/app/happ-proxy-utility-plus/id6746188973".to_string(),
            v2raytun_windows: "https://storage.v2raytun.com/v2RayTun_Setup.exe".to_string(),
            happ_windows: "https://github.com/Happ-proxy/happ-desktop/releases/latest/download/setup-Happ.x64.exe".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
