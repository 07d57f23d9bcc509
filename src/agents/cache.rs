// Content-addressed memoization of parsed step results

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Compute the cache key for a question and its attachments
///
/// Attachment order does not matter; paths are sorted before hashing.
pub fn cache_key(question: &str, attachments: &[String]) -> String {
    let mut sorted: Vec<&str> = attachments.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(question.as_bytes());
    hasher.update(sorted.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parsed results keyed by `cache_key`
///
/// Entries are never evicted; the cache lives as long as the session.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: HashMap<String, Value>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_is_stable_hex_sha256() {
        let key = cache_key("2+2?", &[]);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, cache_key("2+2?", &[]));
    }

    #[test]
    fn test_key_ignores_attachment_order() {
        let a = cache_key("q", &["b.txt".to_string(), "a.txt".to_string()]);
        let b = cache_key("q", &["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_depends_on_question_and_attachments() {
        assert_ne!(cache_key("q1", &[]), cache_key("q2", &[]));
        assert_ne!(cache_key("q", &[]), cache_key("q", &["a.txt".to_string()]));
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = ResponseCache::new();
        assert!(cache.get("k").is_none());

        cache.insert("k".to_string(), json!({"a": 1}));
        assert_eq!(cache.get("k"), Some(&json!({"a": 1})));

        cache.insert("k".to_string(), json!(2));
        assert_eq!(cache.get("k"), Some(&json!(2)));
    }
}
