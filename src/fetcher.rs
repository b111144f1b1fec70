//! Tag page lookup contract and the wire types it returns.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TagSelectError;
use crate::metric::MetricDescriptor;

/// One observed tag combination for a metric, in wire order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRecord(Vec<(String, String)>);

impl TagRecord {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        TagRecord(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl Serialize for TagRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TagRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = TagRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of tag keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<TagRecord, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    entries.push((k, v));
                }
                Ok(TagRecord(entries))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Tag records for one requested metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPage {
    /// Metric name as echoed by the service
    pub name: String,
    #[serde(default)]
    pub tags: Vec<TagRecord>,
}

/// Identity of one page request. Equal queries are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagQuery {
    pub descriptors: Vec<MetricDescriptor>,
    pub page: u32,
    pub limit: u32,
}

/// Source of tag pages, typically a remote lookup service.
///
/// Implementations must be safe to call repeatedly with the same query.
/// Retry and backoff, if any, belong here; callers do not retry.
#[async_trait]
pub trait TagPageFetcher: Send + Sync {
    /// Fetch one page of tags, returning one `TagPage` per descriptor
    async fn fetch_tag_pages(&self, query: &TagQuery) -> Result<Vec<TagPage>, TagSelectError>;
}

/// A resolved query held by a provider
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub pages: Vec<TagPage>,
    pub fetched_at: DateTime<Utc>,
}

impl LoadedPage {
    pub fn new(pages: Vec<TagPage>, fetched_at: DateTime<Utc>) -> Self {
        Self { pages, fetched_at }
    }

    /// Whether the data is older than `max_age` at `now`
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) > max_age
    }
}
