//! Per-client redirect links for the Happ import flow.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::store::cache::{Clock, LoadObserver, Snapshot, TtlCache};
use crate::store::clients::ClientRecord;
use crate::store::source::TableSource;
use crate::store::StoreError;

/// Identifier (client name or token) to destination URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    links: HashMap<String, String>,
}

impl LinkTable {
    /// Decode the link table. Entries that are not non-empty strings are dropped.
    pub fn parse(bytes: &[u8]) -> Result<Self, StoreError> {
        let raw: HashMap<String, Value> = serde_json::from_slice(bytes)?;
        let links = raw
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(url) if !url.is_empty() => Some((key, url)),
                _ => None,
            })
            .collect();
        Ok(Self { links })
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        if identifier.is_empty() {
            return None;
        }
        self.links.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl Snapshot for LinkTable {
    fn entries(&self) -> usize {
        self.len()
    }
}

/// Cache-backed directory over the link table.
pub struct LinkDirectory {
    source: Arc<dyn TableSource>,
    cache: TtlCache<LinkTable>,
}

impl LinkDirectory {
    pub fn new(
        source: Arc<dyn TableSource>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn LoadObserver>,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new("links", ttl, clock, observer),
        }
    }

    pub fn snapshot(&self) -> Arc<LinkTable> {
        self.cache.get(|| LinkTable::parse(&self.source.read()?))
    }

    /// Link for `record`, looked up by name first, then by token.
    pub fn resolve(&self, record: Option<&ClientRecord>) -> Option<String> {
        let record = record?;
        let table = self.snapshot();
        table
            .get(&record.name)
            .or_else(|| table.get(&record.token))
            .map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::cache::{ManualClock, TracingObserver};
    use crate::store::source::MemorySource;

    fn directory(json: &str) -> LinkDirectory {
        LinkDirectory::new(
            Arc::new(MemorySource::new(json)),
            Duration::from_millis(5000),
            Arc::new(ManualClock::new(0)),
            Arc::new(TracingObserver),
        )
    }

    fn record(token: &str, name: &str) -> ClientRecord {
        ClientRecord {
            token: token.into(),
            name: name.into(),
            expire: 0,
        }
    }

    #[test]
    fn test_name_takes_precedence_over_token() {
        let dir = directory(r#"{"alice":"https://by-name","tok":"https://by-token"}"#);
        assert_eq!(
            dir.resolve(Some(&record("tok", "alice"))).as_deref(),
            Some("https://by-name")
        );
        assert_eq!(
            dir.resolve(Some(&record("tok", "bob"))).as_deref(),
            Some("https://by-token")
        );
    }

    #[test]
    fn test_unresolved() {
        let dir = directory(r#"{"alice":"https://by-name"}"#);
        assert!(dir.resolve(None).is_none());
        assert!(dir.resolve(Some(&record("x", "y"))).is_none());
    }

    #[test]
    fn test_empty_values_fall_through() {
        let dir = directory(r#"{"alice":"","tok":"https://by-token","n":42}"#);
        assert_eq!(dir.len(), 1);
        assert_eq!(
            dir.resolve(Some(&record("tok", "alice"))).as_deref(),
            Some("https://by-token")
        );
    }

    #[test]
    fn test_malformed_table_is_empty() {
        let dir = directory(r#"["not", "an", "object"]"#);
        assert!(dir.is_empty());
        assert!(dir.resolve(Some(&record("tok", "alice"))).is_none());
    }
}
