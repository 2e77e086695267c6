use std::collections::HashMap;

use serde::{Deserialize, Serialize};

///
/// How resolved remote folders are remembered within a run.
///
/// `ByName` reproduces the older behaviour: a folder name seen anywhere in the
/// mirrored trees maps to the first remote folder resolved for it, so
/// same-named directories at different places are merged remotely.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeying {
    #[default]
    ByParent,
    ByName,
}

///
/// Remote folder ids resolved during the current run.
/// Entries are written once and never evicted.
///
#[derive(Debug)]
pub struct FolderCache {
    keying: CacheKeying,
    entries: HashMap<(String, String), String>,
}

impl FolderCache {
    pub fn new(keying: CacheKeying) -> Self {
        Self { keying, entries: HashMap::new() }
    }

    fn key(&self, parent_id: &str, name: &str) -> (String, String) {
        match self.keying {
            CacheKeying::ByParent => (parent_id.to_string(), name.to_string()),
            CacheKeying::ByName => (String::new(), name.to_string()),
        }
    }

    pub fn get(&self, parent_id: &str, name: &str) -> Option<String> {
        self.entries.get(&self.key(parent_id, name)).cloned()
    }

    ///
    /// Records `id` for the folder. Returns false, leaving the cache untouched,
    /// if the key was already present.
    ///
    pub fn insert(&mut self, parent_id: &str, name: &str, id: String) -> bool {
        let key = self.key(parent_id, name);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, id);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_parent_separates_same_names() {
        let mut cache = FolderCache::new(CacheKeying::ByParent);
        assert!(cache.insert("p1", "x", "id-1".to_string()));
        assert!(cache.insert("p2", "x", "id-2".to_string()));

        assert_eq!(cache.get("p1", "x"), Some("id-1".to_string()));
        assert_eq!(cache.get("p2", "x"), Some("id-2".to_string()));
        assert_eq!(cache.get("p3", "x"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_by_name_merges_across_parents() {
        let mut cache = FolderCache::new(CacheKeying::ByName);
        assert!(cache.insert("p1", "x", "id-1".to_string()));
        assert!(!cache.insert("p2", "x", "id-2".to_string()));

        assert_eq!(cache.get("p2", "x"), Some("id-1".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let mut cache = FolderCache::new(CacheKeying::ByName);
        cache.insert("p", "Invoices", "id-1".to_string());
        assert_eq!(cache.get("p", "invoices"), None);
        assert!(!cache.is_empty());
    }
}
