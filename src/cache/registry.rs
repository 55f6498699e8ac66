//! Bidirectional tag registry for the in-process backend.
//!
//! Tracks which keys belong to which tags so a whole tag can be evicted
//! without the caller knowing the keys currently cached under it.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::registry";

#[derive(Default)]
struct Index {
    /// Maps tags to the keys stored under them
    tag_to_keys: HashMap<String, HashSet<String>>,
    /// Maps keys to the tags they were stored with
    key_to_tags: HashMap<String, HashSet<String>>,
}

/// Tracks tag → keys and key → tags mappings.
///
/// Both directions live behind one lock so a tag sweep never observes a
/// half-registered key.
pub struct TagRegistry {
    index: Mutex<Index>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            index: Mutex::new(Index::default()),
        }
    }

    /// Add `key` to every tag in `tags`.
    pub fn register(&self, key: &str, tags: &[&str]) {
        if tags.is_empty() {
            return;
        }

        let mut index = mutex_lock(&self.index, SOURCE, "register");
        for tag in tags {
            index
                .tag_to_keys
                .entry((*tag).to_string())
                .or_default()
                .insert(key.to_string());
        }
        index
            .key_to_tags
            .entry(key.to_string())
            .or_default()
            .extend(tags.iter().map(|tag| (*tag).to_string()));
    }

    #[cfg(test)]
    fn keys_for_tag(&self, tag: &str) -> HashSet<String> {
        mutex_lock(&self.index, SOURCE, "keys_for_tag")
            .tag_to_keys
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a key that was deleted, expired or evicted.
    pub fn unregister(&self, key: &str) {
        let mut index = mutex_lock(&self.index, SOURCE, "unregister");
        let Some(tags) = index.key_to_tags.remove(key) else {
            return;
        };
        for tag in tags {
            if let Some(keys) = index.tag_to_keys.get_mut(&tag) {
                keys.remove(key);
                if keys.is_empty() {
                    index.tag_to_keys.remove(&tag);
                }
            }
        }
    }

    /// Remove a tag and every mapping of its member keys.
    ///
    /// Returns the keys that were members so the caller can delete them.
    pub fn take_tag(&self, tag: &str) -> HashSet<String> {
        let mut index = mutex_lock(&self.index, SOURCE, "take_tag");
        let keys = index.tag_to_keys.remove(tag).unwrap_or_default();

        for key in &keys {
            let Some(tags) = index.key_to_tags.remove(key) else {
                continue;
            };
            // A key tagged with several tags leaves all of them: it is about to be deleted.
            for other in tags.iter().filter(|other| other.as_str() != tag) {
                if let Some(members) = index.tag_to_keys.get_mut(other) {
                    members.remove(key);
                    if members.is_empty() {
                        index.tag_to_keys.remove(other);
                    }
                }
            }
        }

        keys
    }

    #[cfg(test)]
    fn tag_count(&self) -> usize {
        mutex_lock(&self.index, SOURCE, "tag_count").tag_to_keys.len()
    }

    #[cfg(test)]
    pub(crate) fn key_count(&self) -> usize {
        mutex_lock(&self.index, SOURCE, "key_count").key_to_tags.len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_lookup() {
        let registry = TagRegistry::new();

        registry.register("tasks:list:p1:l7", &["tasks:all-active"]);
        registry.register("tasks:list:p2:l7", &["tasks:all-active"]);

        let keys = registry.keys_for_tag("tasks:all-active");
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("tasks:list:p1:l7"));
        assert!(keys.contains("tasks:list:p2:l7"));
    }

    #[test]
    fn untagged_register_is_ignored() {
        let registry = TagRegistry::new();
        registry.register("task:1", &[]);
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }

    #[test]
    fn unregister_cleans_up_mappings() {
        let registry = TagRegistry::new();
        registry.register("tasks:list:p1:l7", &["tasks:all-active"]);
        assert_eq!(registry.key_count(), 1);
        assert_eq!(registry.tag_count(), 1);

        registry.unregister("tasks:list:p1:l7");
        assert_eq!(registry.key_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }

    #[test]
    fn take_tag_returns_members_and_drops_other_memberships() {
        let registry = TagRegistry::new();
        registry.register("a", &["t1", "t2"]);
        registry.register("b", &["t1"]);
        registry.register("c", &["t2"]);

        let taken = registry.take_tag("t1");
        assert_eq!(taken.len(), 2);
        assert!(taken.contains("a"));
        assert!(taken.contains("b"));

        // "a" is gone from t2, "c" remains.
        let remaining = registry.keys_for_tag("t2");
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains("c"));
        assert_eq!(registry.key_count(), 1);
    }

    #[test]
    fn take_unknown_tag_is_empty() {
        let registry = TagRegistry::new();
        assert!(registry.take_tag("missing").is_empty());
    }
}
