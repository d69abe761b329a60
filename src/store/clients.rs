//! Client records and token/name lookup.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::store::cache::{Clock, LoadObserver, TtlCache};
use crate::store::source::TableSource;
use crate::store::StoreError;

/// A client as listed in the external client table.
///
/// Addressable by either `token` or `name`. Uniqueness of both is a
/// precondition of the table, not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: String,

    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,

    /// Expiry as unix seconds; 0 when unknown.
    #[serde(default, deserialize_with = "lenient_expire")]
    pub expire: u64,
}

impl ClientRecord {
    /// True if `identifier` equals this record's token or name.
    pub fn matches(&self, identifier: &str) -> bool {
        self.token == identifier || self.name == identifier
    }
}

/// Strings pass through; null or any other JSON type becomes "".
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Ok(s),
        _ => Ok(String::new()),
    }
}

/// Accept numbers, numeric strings and null; anything else is 0.
fn lenient_expire<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(coerce_expire).unwrap_or(0))
}

fn coerce_expire(value: &Value) -> u64 {
    let seconds = match value {
        Value::Number(n) => match n.as_u64() {
            Some(secs) => return secs,
            None => n.as_f64(),
        },
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    seconds
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| secs as u64)
        .unwrap_or(0)
}

/// Decode the client table.
pub fn parse_clients(bytes: &[u8]) -> Result<Vec<ClientRecord>, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Cache-backed directory over the client table.
pub struct ClientDirectory {
    source: Arc<dyn TableSource>,
    cache: TtlCache<Vec<ClientRecord>>,
}

impl ClientDirectory {
    pub fn new(
        source: Arc<dyn TableSource>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn LoadObserver>,
    ) -> Self {
        Self {
            source,
            cache: TtlCache::new("clients", ttl, clock, observer),
        }
    }

    /// Current snapshot of the table.
    pub fn snapshot(&self) -> Arc<Vec<ClientRecord>> {
        self.cache.get(|| parse_clients(&self.source.read()?))
    }

    /// First record, in table order, whose token or name equals `identifier`.
    pub fn lookup(&self, identifier: &str) -> Option<ClientRecord> {
        self.snapshot()
            .iter()
            .find(|record| record.matches(identifier))
            .cloned()
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

    fn directory(json: &str) -> (ClientDirectory, Arc<MemorySource>, Arc<ManualClock>) {
        let source = Arc::new(MemorySource::new(json));
        let clock = Arc::new(ManualClock::new(0));
        let directory = ClientDirectory::new(
            source.clone(),
            Duration::from_millis(5000),
            clock.clone(),
            Arc::new(TracingObserver),
        );
        (directory, source, clock)
    }

    #[test]
    fn test_lookup_by_token_and_name() {
        let (dir, _, _) = directory(
            r#"[{"token":"tok123","name":"alice","expire":1700000000},
                {"token":"tok456","name":"bob","expire":0}]"#,
        );

        assert_eq!(dir.lookup("tok123").unwrap().name, "alice");
        assert_eq!(dir.lookup("bob").unwrap().token, "tok456");
        assert!(dir.lookup("carol").is_none());
    }

    #[test]
    fn test_first_match_in_table_order_wins() {
        // "x" is the second record's token and the first record's name.
        let (dir, _, _) = directory(
            r#"[{"token":"a","name":"x"},{"token":"x","name":"b"}]"#,
        );
        assert_eq!(dir.lookup("x").unwrap().token, "a");
    }

    #[test]
    fn test_malformed_or_missing_table_is_empty() {
        let (dir, source, clock) = directory("{not json");
        assert!(dir.lookup("alice").is_none());
        assert!(dir.is_empty());

        source.remove();
        clock.advance(Duration::from_secs(10));
        assert!(dir.lookup("alice").is_none());
    }

    #[test]
    fn test_stale_snapshot_within_ttl() {
        let (dir, source, clock) = directory(r#"[{"token":"t1","name":"alice"}]"#);
        assert!(dir.lookup("alice").is_some());

        source.set("[]");
        clock.advance(Duration::from_millis(1000));
        assert!(dir.lookup("alice").is_some());

        clock.advance(Duration::from_millis(4000));
        assert!(dir.lookup("alice").is_none());
    }

    #[test]
    fn test_lenient_expire() {
        let records = parse_clients(
            br#"[{"token":"a","name":"a","expire":"1700000000"},
                 {"token":"b","name":"b","expire":null},
                 {"token":"c","name":"c"},
                 {"token":"d","name":"d","expire":-5},
                 {"token":"e","name":"e","expire":"soon"},
                 {"token":"f","name":"f","expire":1.7e9}]"#,
        )
        .unwrap();

        let expires: Vec<u64> = records.iter().map(|r| r.expire).collect();
        assert_eq!(expires, vec![1_700_000_000, 0, 0, 0, 0, 1_700_000_000]);
    }

    #[test]
    fn test_bad_identity_fields_do_not_drop_the_table() {
        let (dir, _, _) = directory(
            r#"[{"token":"tok123","name":"alice","expire":1700000000},
                {"token":"t2","name":null,"expire":0},
                {"token":42,"name":["x"]}]"#,
        );

        assert_eq!(dir.len(), 3);
        assert_eq!(dir.lookup("alice").unwrap().expire, 1_700_000_000);
        let nameless = dir.lookup("t2").unwrap();
        assert_eq!(nameless.name, "");
        assert!(dir.lookup("42").is_none());
    }

    #[test]
    fn test_missing_identity_fields_never_match_real_keys() {
        let (dir, _, _) = directory(r#"[{"expire":5},{"token":"t","name":"n"}]"#);
        assert_eq!(dir.len(), 2);
        assert_eq!(dir.lookup("n").unwrap().token, "t");
    }
}
