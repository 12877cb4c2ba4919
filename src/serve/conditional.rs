use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Warning header value attached when stale bytes are served after a failed
/// refresh (RFC 7234 section 5.5.1).
pub const STALE_WARNING: &str = "110 - \"Response is stale\"";

/// IMF-fixdate, the only format we emit for Last-Modified.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Strong validator for a rendered feed body: the first 8 bytes of its
/// SHA-256 digest, hex encoded and quoted.
pub fn fingerprint(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let mut hex = String::with_capacity(18);
    hex.push('"');
    for byte in &digest[..8] {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex.push('"');
    hex
}

/// Conditional headers carried in from the client request.
#[derive(Debug, Default, Clone)]
pub struct ConditionalRequest {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

/// Headers to attach to a feed response, conditional or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub etag: String,
    pub last_modified: String,
    pub cache_control: String,
}

/// Decide whether the client's cached copy is still current.
///
/// `If-None-Match` wins when present, per RFC 7232 section 6. The date
/// comparison is at second resolution, which matches both the header format
/// and the stored timestamp.
pub fn not_modified(
    request: &ConditionalRequest,
    etag: &str,
    built_at: DateTime<Utc>,
) -> bool {
    if let Some(candidate) = &request.if_none_match {
        return etag_matches(candidate, etag);
    }
    if let Some(since) = &request.if_modified_since {
        if let Ok(since) = DateTime::parse_from_rfc2822(since) {
            return built_at.timestamp() <= since.timestamp();
        }
    }
    false
}

/// Headers describing a cached build: validator, build time, and how long
/// the response may be reused.
pub fn response_headers(
    etag: &str,
    built_at: DateTime<Utc>,
    max_age_secs: i64,
) -> ResponseHeaders {
    ResponseHeaders {
        etag: etag.to_string(),
        last_modified: built_at.format(HTTP_DATE).to_string(),
        cache_control: format!("public, max-age={}", max_age_secs.max(0)),
    }
}

fn etag_matches(header: &str, etag: &str) -> bool {
    if header.trim() == "*" {
        return true;
    }
    header.split(',').any(|candidate| {
        let candidate = candidate.trim();
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate == etag
    })
}
