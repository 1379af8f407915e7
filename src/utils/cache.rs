// In-memory TTL cache holding outstanding one-time codes.
// Keys are namespaced by purpose+email, so concurrent flows for
// different users never contend on the same entry.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Expiring key-value store for one-time codes. Explicitly constructed
/// and shared via `web::Data`; nothing survives a process restart, which
/// is acceptable because codes are short-lived and re-issuable.
pub struct OtpCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl OtpCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Stores `value` under `key`, replacing any prior entry, with
    /// automatic removal once `ttl` has elapsed.
    pub fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the value if present and unexpired. Expired entries are
    /// dropped on read, so a code exactly at or past its TTL is absent.
    pub fn get(&self, key: &str) -> Option<String> {
        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but expired: take the write lock and drop it.
        self.entries.write().unwrap().remove(key);
        None
    }

    /// Removes an entry immediately (a code is consumed on first
    /// successful use).
    pub fn remove(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    /// Drops every expired entry. Called periodically by the background
    /// sweeper so abandoned codes do not pile up.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

impl Default for OtpCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_returns_value() {
        let cache = OtpCache::new();
        cache.set("OTP_a@x.com", "123456", Duration::from_secs(300));
        assert_eq!(cache.get("OTP_a@x.com"), Some("123456".to_string()));
    }

    #[test]
    fn missing_key_is_absent() {
        let cache = OtpCache::new();
        assert_eq!(cache.get("OTP_nobody@x.com"), None);
    }

    #[test]
    fn reissue_overwrites_previous_code() {
        let cache = OtpCache::new();
        cache.set("OTP_a@x.com", "111111", Duration::from_secs(300));
        cache.set("OTP_a@x.com", "222222", Duration::from_secs(300));
        assert_eq!(cache.get("OTP_a@x.com"), Some("222222".to_string()));
    }

    #[test]
    fn remove_deletes_immediately() {
        let cache = OtpCache::new();
        cache.set("OTP_a@x.com", "123456", Duration::from_secs(300));
        cache.remove("OTP_a@x.com");
        assert_eq!(cache.get("OTP_a@x.com"), None);
    }

    #[test]
    fn expired_entry_is_absent() {
        let cache = OtpCache::new();
        cache.set("OTP_a@x.com", "123456", Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("OTP_a@x.com"), None);
        // The expired entry was dropped on read, not just hidden.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_ttl_is_immediately_absent() {
        let cache = OtpCache::new();
        cache.set("OTP_a@x.com", "123456", Duration::from_secs(0));
        assert_eq!(cache.get("OTP_a@x.com"), None);
    }

    #[test]
    fn purge_drops_only_expired_entries() {
        let cache = OtpCache::new();
        cache.set("OTP_old@x.com", "111111", Duration::from_millis(5));
        cache.set("OTP_new@x.com", "222222", Duration::from_secs(300));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.get("OTP_new@x.com"), Some("222222".to_string()));
    }

    #[test]
    fn keys_are_namespaced_independently() {
        let cache = OtpCache::new();
        cache.set("OTP_a@x.com", "111111", Duration::from_secs(300));
        cache.set("Forgot-Password_OTP_a@x.com", "222222", Duration::from_secs(300));
        assert_eq!(cache.get("OTP_a@x.com"), Some("111111".to_string()));
        assert_eq!(
            cache.get("Forgot-Password_OTP_a@x.com"),
            Some("222222".to_string())
        );
    }
}
