//! The link registry: the ordered collection of shortened links.
//!
//! The registry owns every record in memory and mirrors the whole collection
//! into a single key of a [`KeyValueStorage`] after each mutation. Reads never
//! touch storage. Storage failures are logged and otherwise ignored, so the
//! in-memory collection stays authoritative for the rest of the session.

use chrono::Duration;
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::codegen::{CodeGenerator, RandomCodeGenerator, DEFAULT_CODE_LENGTH};
use crate::models::LinkRecord;
use crate::storage::{KeyValueStorage, StorageError, StorageResult};

pub const DEFAULT_STORAGE_KEY: &str = "url-shortener-links";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/";

/// Rejections surfaced to whoever asked for a new link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a URL")]
    EmptyUrl,
    #[error("Please enter a valid URL")]
    InvalidUrl(String),
    #[error("This alias is already taken")]
    AliasTaken(String),
    #[error("Expiry of {0} hours is out of range")]
    ExpiryOutOfRange(i64),
}

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Key under which the whole collection is stored
    pub storage_key: String,
    /// Prefix joined with the short code to build `short_url`
    pub base_url: String,
    /// Length of generated codes
    pub code_length: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            code_length: DEFAULT_CODE_LENGTH,
        }
    }
}

/// Registry shared between the API handlers and the sweeper.
pub type SharedRegistry = Arc<tokio::sync::Mutex<LinkRegistry>>;

pub struct LinkRegistry {
    /// Most recent first
    links: Vec<LinkRecord>,
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn CodeGenerator>,
    options: RegistryOptions,
    last_id: i64,
}

impl LinkRegistry {
    /// Create an empty registry using the system clock and random codes.
    ///
    /// Nothing is read from storage until [`LinkRegistry::load`] is called.
    pub fn new(storage: Arc<dyn KeyValueStorage>, options: RegistryOptions) -> Self {
        let generator = Arc::new(RandomCodeGenerator::new(options.code_length));
        Self {
            links: Vec::new(),
            storage,
            clock: Arc::new(SystemClock),
            generator,
            options,
            last_id: 0,
        }
    }

    /// Create a registry and populate it from storage.
    pub async fn open(storage: Arc<dyn KeyValueStorage>, options: RegistryOptions) -> Self {
        let mut registry = Self::new(storage, options);
        registry.load().await;
        registry
    }

    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Every stored record, expired ones included, most recent first.
    pub fn records(&self) -> &[LinkRecord] {
        &self.links
    }

    pub fn get(&self, short_code: &str) -> Option<&LinkRecord> {
        self.links.iter().find(|link| link.short_code == short_code)
    }

    fn contains_code(&self, short_code: &str) -> bool {
        self.links.iter().any(|link| link.short_code == short_code)
    }

    /// Shorten `long_url`, optionally under a chosen alias and with a TTL in hours.
    ///
    /// A non-positive or absent TTL means the link never expires. The alias is
    /// checked against every stored record, including expired ones that have
    /// not been swept yet.
    pub async fn create(
        &mut self,
        long_url: &str,
        alias: Option<&str>,
        ttl_hours: Option<i64>,
    ) -> Result<LinkRecord, ValidationError> {
        let long_url = long_url.trim();
        validate_url(long_url)?;

        let alias = alias.map(str::trim).filter(|a| !a.is_empty());
        if let Some(alias) = alias {
            if self.contains_code(alias) {
                return Err(ValidationError::AliasTaken(alias.to_string()));
            }
        }

        let expiry_hours = match ttl_hours.filter(|hours| *hours > 0) {
            Some(hours) => {
                Some(u32::try_from(hours).map_err(|_| ValidationError::ExpiryOutOfRange(hours))?)
            }
            None => None,
        };

        let now = self.clock.now();
        let expires_at = match expiry_hours {
            Some(hours) => {
                let hours = i64::from(hours);
                Some(
                    now.checked_add_signed(Duration::hours(hours))
                        .ok_or(ValidationError::ExpiryOutOfRange(hours))?,
                )
            }
            None => None,
        };

        let short_code = match alias {
            Some(alias) => alias.to_string(),
            None => self.generate_short_code(),
        };

        let id = self.next_id(now.timestamp_millis());
        let link = LinkRecord {
            id,
            long_url: long_url.to_string(),
            short_url: self.short_url_for(&short_code),
            short_code,
            clicks: 0,
            created_at: now,
            expiry_hours,
            expires_at,
        };

        debug!(short_code = %link.short_code, expires_at = ?link.expires_at, "created link");
        self.links.insert(0, link.clone());
        self.save().await;

        Ok(link)
    }

    /// Draw codes until one is not held by any stored record.
    pub fn generate_short_code(&self) -> String {
        loop {
            let code = self.generator.generate();
            if !self.contains_code(&code) {
                return code;
            }
            debug!(code = %code, "generated short code collided, drawing again");
        }
    }

    /// Count a click on a live link.
    ///
    /// Unknown and expired codes are ignored and yield `None`; otherwise the
    /// updated record is returned.
    pub async fn track_click(&mut self, short_code: &str) -> Option<LinkRecord> {
        let now = self.clock.now();
        let link = self
            .links
            .iter_mut()
            .find(|link| link.short_code == short_code && !link.is_expired(now))?;

        link.clicks += 1;
        let updated = link.clone();
        self.save().await;

        Some(updated)
    }

    /// Drop expired records and return them in registry order.
    ///
    /// Storage is only written when something was removed.
    pub async fn sweep_expired(&mut self) -> Vec<LinkRecord> {
        let now = self.clock.now();
        let (expired, active): (Vec<_>, Vec<_>) = std::mem::take(&mut self.links)
            .into_iter()
            .partition(|link| link.is_expired(now));
        self.links = active;

        if !expired.is_empty() {
            info!(removed = expired.len(), "swept expired links");
            self.save().await;
        }

        expired
    }

    /// Live records, most recent first, at most `limit` of them.
    pub fn list_active(&self, limit: usize) -> Vec<LinkRecord> {
        let now = self.clock.now();
        self.links
            .iter()
            .filter(|link| !link.is_expired(now))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Delete a record regardless of its expiry.
    pub async fn remove(&mut self, short_code: &str) -> Option<LinkRecord> {
        let index = self
            .links
            .iter()
            .position(|link| link.short_code == short_code)?;
        let removed = self.links.remove(index);
        self.save().await;
        Some(removed)
    }

    /// Persist the whole collection, logging instead of failing.
    pub async fn save(&self) {
        if let Err(e) = self.try_save().await {
            warn!(
                key = %self.options.storage_key,
                error = %e,
                "failed to persist links, keeping in-memory state"
            );
        }
    }

    pub async fn try_save(&self) -> StorageResult<()> {
        let encoded = encode_links(&self.links).map_err(|e| StorageError::Other(e.into()))?;
        self.storage
            .set(&self.options.storage_key, &encoded)
            .await
    }

    /// Replace the in-memory collection with what storage holds.
    ///
    /// Missing, unreadable or malformed state loads as an empty collection.
    /// Returns the number of records loaded.
    pub async fn load(&mut self) -> usize {
        let raw = match self.storage.get(&self.options.storage_key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.options.storage_key, error = %e, "failed to read stored links");
                None
            }
        };

        self.links = decode_links(raw.as_deref());
        self.last_id = self.links.iter().map(|link| link.id).max().unwrap_or(0);
        self.links.len()
    }

    fn next_id(&mut self, candidate: i64) -> i64 {
        let id = if candidate > self.last_id {
            candidate
        } else {
            self.last_id + 1
        };
        self.last_id = id;
        id
    }

    fn short_url_for(&self, short_code: &str) -> String {
        let base = &self.options.base_url;
        if base.ends_with('/') {
            format!("{base}{short_code}")
        } else {
            format!("{base}/{short_code}")
        }
    }
}

/// Accept http(s) URLs, assuming `https://` for inputs without a scheme.
pub fn validate_url(input: &str) -> Result<(), ValidationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let candidate = if input.starts_with("http") {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("https://{input}"))
    };

    match Url::parse(&candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl(input.to_string())),
    }
}

pub fn encode_links(links: &[LinkRecord]) -> serde_json::Result<String> {
    serde_json::to_string(links)
}

/// Decode a stored collection; absent or malformed input decodes as empty.
pub fn decode_links(raw: Option<&str>) -> Vec<LinkRecord> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "stored links are malformed, starting empty");
        Vec::new()
    })
}
