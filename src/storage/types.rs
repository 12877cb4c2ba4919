use chrono::{DateTime, Utc};

/// A feed's configuration record. The serving engine treats this as
/// read-only input; creation and editing belong to the management API.
#[derive(Debug, Clone)]
pub struct FeedRecord {
    pub id: String,
    pub name: String,
    /// Capability secret embedded in the public feed URL.
    pub secret: String,
    pub subjects: Vec<String>,
    pub limit_per_subject: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One persisted render of a feed.
///
/// Entries are replaced whole on every successful refresh, never partially
/// updated; a failed refresh only annotates `last_error`. `expires_at` is
/// always `built_at` plus the configured TTL.
#[derive(Debug, Clone)]
pub struct FeedCacheEntry {
    pub feed_id: String,
    pub xml: Vec<u8>,
    pub etag: String,
    pub built_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl FeedCacheEntry {
    pub fn has_body(&self) -> bool {
        !self.xml.is_empty()
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.has_body() && now < self.expires_at
    }
}

/// Unix seconds to `DateTime<Utc>`, pinning out-of-range values to the epoch.
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(xml: &[u8], expires_in: Duration) -> FeedCacheEntry {
        let now = Utc::now();
        FeedCacheEntry {
            feed_id: "f1".to_string(),
            xml: xml.to_vec(),
            etag: "\"abc\"".to_string(),
            built_at: now,
            expires_at: now + expires_in,
            last_error: None,
        }
    }

    #[test]
    fn test_freshness_requires_body_and_future_expiry() {
        let now = Utc::now();
        assert!(entry(b"<rss/>", Duration::seconds(60)).is_fresh(now));
        assert!(!entry(b"<rss/>", Duration::seconds(-1)).is_fresh(now));
        assert!(!entry(b"", Duration::seconds(60)).is_fresh(now));
    }
}
