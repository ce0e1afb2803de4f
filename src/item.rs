//! Normalized representation of records pulled from providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record from an external provider in the common shape.
///
/// `id` and `name` are never empty: [`IntegrationItem::new`] refuses blank
/// values, and connectors fall back to a synthetic name (e.g. `Record {id}`)
/// when the natural one is missing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntegrationItem {
    /// Provider-native identifier
    pub id: String,
    pub name: String,
    /// `record`, `contact`, `company`, `page`, `database`, ...
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_time: Option<DateTime<Utc>>,
}

impl IntegrationItem {
    /// Returns `None` when `id` or `name` is blank.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        item_type: impl Into<String>,
    ) -> Option<Self> {
        let id = id.into();
        let name = name.into();
        if id.trim().is_empty() || name.trim().is_empty() {
            return None;
        }
        Some(Self {
            id,
            name,
            item_type: item_type.into(),
            parent_id: None,
            parent_name: None,
            properties: Map::new(),
            url: None,
            creation_time: None,
            last_modified_time: None,
        })
    }

    pub fn with_parent(mut self, parent_id: Option<String>, parent_name: Option<String>) -> Self {
        self.parent_id = parent_id;
        self.parent_name = parent_name;
        self
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    /// Sets timestamps from RFC 3339 strings; unparsable values are dropped.
    pub fn with_times(mut self, created: Option<&str>, modified: Option<&str>) -> Self {
        self.creation_time = created.and_then(parse_timestamp);
        self.last_modified_time = modified.and_then(parse_timestamp);
        self
    }
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// An upstream call that did not yield usable data.
///
/// `status` is the HTTP status, or 0 when no response arrived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamFailure {
    /// What was being fetched, e.g. `list tables` or `query database abc`
    pub stage: String,
    pub status: u16,
    pub message: String,
}

/// Result of a full item fetch.
///
/// An empty `items` with no `failures` means the provider has nothing; an
/// empty `items` with failures means the provider could not be read.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemListing {
    pub items: Vec<IntegrationItem>,
    pub failures: Vec<UpstreamFailure>,
}

impl ItemListing {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every upstream call succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Records a failed upstream call; items it would have produced are absent.
    pub fn record_failure(&mut self, failure: UpstreamFailure) {
        tracing::warn!(
            stage = %failure.stage,
            status = failure.status,
            message = %failure.message,
            "Upstream call failed, continuing without its items"
        );
        self.failures.push(failure);
    }
}
