use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Single-slot TTL cache for the aggregate feed, which has no persisted
/// identity to key on.
///
/// One lock guards both reads and writes; there is exactly one logical feed
/// behind this tier, so per-key granularity buys nothing.
pub struct EphemeralCache {
    slot: Mutex<Option<SlotEntry>>,
    ttl: Duration,
}

struct SlotEntry {
    bytes: Vec<u8>,
    stored_at: Instant,
}

impl EphemeralCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    /// Returns the cached bytes if the slot is populated and within TTL.
    pub fn get(&self) -> Option<Vec<u8>> {
        let slot = self.slot.lock().expect("ephemeral cache lock poisoned");
        slot.as_ref()
            .filter(|entry| entry.stored_at.elapsed() <= self.ttl)
            .map(|entry| entry.bytes.clone())
    }

    /// Replaces the slot and resets its timestamp.
    pub fn set(&self, bytes: Vec<u8>) {
        let mut slot = self.slot.lock().expect("ephemeral cache lock poisoned");
        *slot = Some(SlotEntry {
            bytes,
            stored_at: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_misses() {
        let cache = EphemeralCache::new(Duration::from_secs(60));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_set_then_get_within_ttl() {
        let cache = EphemeralCache::new(Duration::from_secs(60));
        cache.set(b"<rss/>".to_vec());
        assert_eq!(cache.get(), Some(b"<rss/>".to_vec()));
    }

    #[test]
    fn test_expired_entry_misses() {
        let cache = EphemeralCache::new(Duration::ZERO);
        cache.set(b"<rss/>".to_vec());
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn test_set_replaces_and_resets_timestamp() {
        let cache = EphemeralCache::new(Duration::from_secs(60));
        cache.set(b"old".to_vec());
        cache.set(b"new".to_vec());
        assert_eq!(cache.get(), Some(b"new".to_vec()));
    }
}
