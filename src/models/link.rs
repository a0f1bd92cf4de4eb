use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single shortened link as held by the registry and persisted to the store.
///
/// Field names follow the stored JSON layout, so a collection written by one
/// process can be read back by another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub id: i64,
    #[serde(rename = "longURL")]
    pub long_url: String,
    pub short_code: String,
    #[serde(rename = "shortURL")]
    pub short_url: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expiry_hours: Option<u32>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkRecord {
    /// A record is expired once its expiry lies strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Body of a create request. Field names are camelCase like the records;
/// `expiry_hours` is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, alias = "expiry_hours")]
    pub expiry_hours: Option<i64>,
}
