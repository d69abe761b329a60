//! Path grammars for subscription fetches and import links.
//!
//! # Grammars
//! ```text
//! subscription: /sub/{key}
//! import:       /i/{key}[/{platform}]    platform ∈ ios | android | happ | mac | sub
//! key:          [A-Za-z0-9._-]+
//! ```
//!
//! # Design Decisions
//! - Hand-written matchers, single pass, no regex
//! - Whole-path matches only; trailing slashes or extra segments fail
//! - Platform is a closed enum so dispatch is exhaustive

use std::fmt;
use std::str::FromStr;

const SUBSCRIPTION_PREFIX: &str = "/sub/";
const IMPORT_PREFIX: &str = "/i/";

/// Target of an import link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Bare `/i/{key}`: the platform-selection page.
    Menu,
    Ios,
    Android,
    Happ,
    Mac,
    /// Plain redirect to the subscription URL.
    Sub,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Menu => "menu",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Happ => "happ",
            Platform::Mac => "mac",
            Platform::Sub => "sub",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path segment that is not one of the import platform suffixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    /// Parses the explicit suffixes only; `menu` is never written in a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ios" => Ok(Platform::Ios),
            "android" => Ok(Platform::Android),
            "happ" => Ok(Platform::Happ),
            "mac" => Ok(Platform::Mac),
            "sub" => Ok(Platform::Sub),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// A matched `/sub/{key}` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionPath<'a> {
    pub key: &'a str,
}

/// A matched `/i/{key}[/{platform}]` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportPath<'a> {
    pub key: &'a str,
    pub platform: Platform,
}

fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-')
}

/// Returns the segment if it is a non-empty run of key characters.
fn key(segment: &str) -> Option<&str> {
    (!segment.is_empty() && segment.bytes().all(is_key_byte)).then_some(segment)
}

/// Match the subscription grammar. `None` means "not applicable".
pub fn match_subscription(path: &str) -> Option<SubscriptionPath<'_>> {
    let rest = path.strip_prefix(SUBSCRIPTION_PREFIX)?;
    key(rest).map(|key| SubscriptionPath { key })
}

/// Match the import grammar. A bare key selects [`Platform::Menu`].
pub fn match_import(path: &str) -> Option<ImportPath<'_>> {
    let rest = path.strip_prefix(IMPORT_PREFIX)?;
    let (key_segment, platform) = match rest.split_once('/') {
        Some((key_segment, suffix)) => (key_segment, suffix.parse::<Platform>().ok()?),
        None => (rest, Platform::Menu),
    };
    key(key_segment).map(|key| ImportPath { key, platform })
}
