use anyhow::{Context, Result};
use chrono::{SubsecRound, Utc};
use log::{debug, error};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::storage::{HistoryRecord, KeyValueStore};

pub const HISTORY_STORAGE_KEY: &str = "translation_history";
pub const MAX_HISTORY_ITEMS: usize = 100;

const CAPACITY: NonZeroUsize = match NonZeroUsize::new(MAX_HISTORY_ITEMS) {
    Some(n) => n,
    None => panic!("history capacity must be non-zero"),
};

/// Dedup key: the same text translated into the same target language.
type PairKey = (String, String);

fn pair_key(record: &HistoryRecord) -> PairKey {
    (record.original_text.clone(), record.target_language.clone())
}

/// Bounded, deduplicating translation history persisted as one JSON blob.
///
/// Records live in an LRU map keyed by (original text, target language):
/// saving an existing pair replaces it and promotes it to most recent, and
/// overflowing the capacity drops the least recently saved record.
pub struct HistoryStore {
    storage: Box<dyn KeyValueStore>,
    // Serializes read-modify-write cycles on the shared blob
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(storage: Box<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// All records, most recent first. Read faults are logged and yield an
    /// empty history.
    pub fn get_all(&self) -> Vec<HistoryRecord> {
        Self::to_records(&self.load_cache())
    }

    pub fn save(
        &self,
        original_text: &str,
        translated_text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<HistoryRecord> {
        let _guard = self.lock();
        let mut cache = self.load_cache();

        // Stored with millisecond precision; never earlier than the current head
        let now = Utc::now().trunc_subsecs(3);
        let timestamp = cache
            .iter()
            .next()
            .map_or(now, |(_, head)| head.timestamp.max(now));

        let record = HistoryRecord {
            id: Uuid::new_v4().to_string(),
            original_text: original_text.to_string(),
            translated_text: translated_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            timestamp,
        };

        if let Some((_, displaced)) = cache.push(pair_key(&record), record.clone()) {
            if pair_key(&displaced) == pair_key(&record) {
                debug!("Replaced history entry {} with {}", displaced.id, record.id);
            } else {
                debug!("Evicted oldest history entry {}", displaced.id);
            }
        }

        self.persist(&Self::to_records(&cache))
            .context("Failed to save translation")?;
        Ok(record)
    }

    /// Removes the record with `id`. Returns whether anything was removed.
    pub fn delete_item(&self, id: &str) -> Result<bool> {
        let _guard = self.lock();
        let mut records = self.get_all();
        let before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == before {
            return Ok(false);
        }

        self.persist(&records)
            .context("Failed to delete history item")?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<()> {
        let _guard = self.lock();
        self.storage
            .remove(HISTORY_STORAGE_KEY)
            .context("Failed to clear history")
    }

    pub fn count(&self) -> usize {
        self.get_all().len()
    }

    pub fn get(&self, id: &str) -> Option<HistoryRecord> {
        self.get_all().into_iter().find(|r| r.id == id)
    }

    /// Case-insensitive substring search over original and translated text.
    pub fn search(&self, query: &str) -> Vec<HistoryRecord> {
        let query = query.to_lowercase();
        self.get_all()
            .into_iter()
            .filter(|r| {
                r.original_text.to_lowercase().contains(&query)
                    || r.translated_text.to_lowercase().contains(&query)
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), so a poisoned lock holds no broken state
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_records(&self) -> Result<Vec<HistoryRecord>> {
        let content = match self.storage.get(HISTORY_STORAGE_KEY)? {
            Some(content) if !content.trim().is_empty() => content,
            _ => return Ok(Vec::new()),
        };

        let mut records: Vec<HistoryRecord> =
            serde_json::from_str(&content).context("History blob is not a valid record list")?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    fn load_cache(&self) -> LruCache<PairKey, HistoryRecord> {
        let records = self.load_records().unwrap_or_else(|e| {
            error!("Failed to get history: {:#}", e);
            Vec::new()
        });

        // Oldest first, so the newest entry of any duplicate pair wins and
        // ends up most recently used
        let mut cache = LruCache::new(CAPACITY);
        for record in records.into_iter().rev() {
            cache.put(pair_key(&record), record);
        }
        cache
    }

    fn to_records(cache: &LruCache<PairKey, HistoryRecord>) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> = cache.iter().map(|(_, r)| r.clone()).collect();
        // Stable: equal timestamps keep most-recently-used order
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records
    }

    fn persist(&self, records: &[HistoryRecord]) -> Result<()> {
        let content = serde_json::to_string(records)?;
        self.storage.set(HISTORY_STORAGE_KEY, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn memory_history() -> HistoryStore {
        HistoryStore::new(Box::new(MemoryStore::new()))
    }

    /// Reads succeed with a fixed blob, every write fails.
    struct ReadOnlyStore {
        blob: Option<String>,
    }

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(self.blob.clone())
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("disk full"))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    #[test]
    fn save_returns_record_and_lists_newest_first() -> Result<()> {
        let history = memory_history();
        let first = history.save("xin chào", "hello", "Vietnamese", "English")?;
        let second = history.save("good night", "chúc ngủ ngon", "English", "Vietnamese")?;

        assert_ne!(first.id, second.id);
        let all = history.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
        assert!(all[0].timestamp >= all[1].timestamp);
        Ok(())
    }

    #[test]
    fn keeps_only_the_most_recent_hundred() -> Result<()> {
        let history = memory_history();
        for i in 0..105 {
            history.save(&format!("text {}", i), &format!("out {}", i), "English", "Vietnamese")?;
        }

        let all = history.get_all();
        assert_eq!(all.len(), MAX_HISTORY_ITEMS);
        assert_eq!(all[0].original_text, "text 104");
        assert_eq!(all[MAX_HISTORY_ITEMS - 1].original_text, "text 5");
        assert!(all.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(!all.iter().any(|r| r.original_text == "text 4"));
        Ok(())
    }

    #[test]
    fn duplicate_pair_replaces_and_becomes_most_recent() -> Result<()> {
        let history = memory_history();
        let old = history.save("cat", "con mèo", "English", "Vietnamese")?;
        history.save("dog", "con chó", "English", "Vietnamese")?;
        let new = history.save("cat", "mèo", "English", "Vietnamese")?;

        assert_eq!(history.count(), 2);
        let all = history.get_all();
        assert_eq!(all[0].id, new.id);
        assert_eq!(all[0].translated_text, "mèo");
        assert!(history.get(&old.id).is_none());
        Ok(())
    }

    #[test]
    fn same_text_to_different_targets_is_kept_separately() -> Result<()> {
        let history = memory_history();
        history.save("hello", "xin chào", "English", "Vietnamese")?;
        history.save("hello", "bonjour", "English", "French")?;
        assert_eq!(history.count(), 2);

        // Source language is not part of the key
        history.save("hello", "salut", "German", "French")?;
        assert_eq!(history.count(), 2);
        assert_eq!(history.get_all()[0].source_language, "German");
        Ok(())
    }

    #[test]
    fn replacing_at_capacity_does_not_evict() -> Result<()> {
        let history = memory_history();
        for i in 0..MAX_HISTORY_ITEMS {
            history.save(&format!("text {}", i), "x", "English", "Vietnamese")?;
        }
        history.save("text 0", "y", "English", "Vietnamese")?;

        let all = history.get_all();
        assert_eq!(all.len(), MAX_HISTORY_ITEMS);
        assert_eq!(all[0].original_text, "text 0");
        assert!(all.iter().any(|r| r.original_text == "text 1"));
        Ok(())
    }

    #[test]
    fn delete_item_removes_exactly_one() -> Result<()> {
        let history = memory_history();
        let a = history.save("a", "A", "English", "Vietnamese")?;
        history.save("b", "B", "English", "Vietnamese")?;

        assert!(!history.delete_item("no-such-id")?);
        assert_eq!(history.count(), 2);

        assert!(history.delete_item(&a.id)?);
        assert_eq!(history.count(), 1);
        assert!(history.get(&a.id).is_none());
        Ok(())
    }

    #[test]
    fn clear_empties_history() -> Result<()> {
        let history = memory_history();
        history.save("a", "A", "English", "Vietnamese")?;
        history.save("b", "B", "English", "Vietnamese")?;

        history.clear()?;
        assert_eq!(history.count(), 0);
        assert!(history.get_all().is_empty());
        Ok(())
    }

    #[test]
    fn search_is_case_insensitive_on_both_sides() -> Result<()> {
        let history = memory_history();
        history.save("Good Morning", "Chào buổi sáng", "English", "Vietnamese")?;
        history.save("Thank you", "Cảm ơn", "English", "Vietnamese")?;

        assert_eq!(history.search("MORNING").len(), 1);
        assert_eq!(history.search("cảm").len(), 1);
        assert_eq!(history.search("o").len(), 2);
        assert!(history.search("bonjour").is_empty());
        Ok(())
    }

    #[test]
    fn search_results_are_most_recent_first() -> Result<()> {
        let history = memory_history();
        history.save("ALPHA two", "hai", "English", "Vietnamese")?;
        history.save("gamma", "ba", "English", "Vietnamese")?;
        history.save("Alpha one", "một", "English", "Vietnamese")?;

        let found: Vec<String> = history
            .search("alpha")
            .into_iter()
            .map(|r| r.original_text)
            .collect();
        assert_eq!(found, vec!["Alpha one".to_string(), "ALPHA two".to_string()]);
        Ok(())
    }

    #[test]
    fn corrupted_blob_reads_as_empty() -> Result<()> {
        let storage = MemoryStore::new();
        storage.set(HISTORY_STORAGE_KEY, "{not json")?;
        let history = HistoryStore::new(Box::new(storage));

        assert!(history.get_all().is_empty());
        assert_eq!(history.count(), 0);

        // The next save starts a fresh history
        history.save("a", "A", "English", "Vietnamese")?;
        assert_eq!(history.count(), 1);
        Ok(())
    }

    #[test]
    fn unsorted_and_oversized_blob_is_normalized_on_read() -> Result<()> {
        let base = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let records: Vec<HistoryRecord> = (0..120)
            .map(|i| HistoryRecord {
                id: format!("id-{}", i),
                original_text: format!("text {}", i),
                translated_text: "x".to_string(),
                source_language: "English".to_string(),
                target_language: "Vietnamese".to_string(),
                timestamp: base + Duration::seconds(i),
            })
            .collect();

        let storage = MemoryStore::new();
        storage.set(HISTORY_STORAGE_KEY, &serde_json::to_string(&records)?)?;
        let history = HistoryStore::new(Box::new(storage));

        let all = history.get_all();
        assert_eq!(all.len(), MAX_HISTORY_ITEMS);
        assert_eq!(all[0].id, "id-119");
        assert_eq!(all[MAX_HISTORY_ITEMS - 1].id, "id-20");
        Ok(())
    }

    #[test]
    fn new_record_is_not_older_than_head() -> Result<()> {
        let future = (Utc::now() + Duration::hours(1)).trunc_subsecs(3);
        let record = HistoryRecord {
            id: "future".to_string(),
            original_text: "a".to_string(),
            translated_text: "A".to_string(),
            source_language: "English".to_string(),
            target_language: "Vietnamese".to_string(),
            timestamp: future,
        };
        let storage = MemoryStore::new();
        storage.set(HISTORY_STORAGE_KEY, &serde_json::to_string(&vec![record])?)?;
        let history = HistoryStore::new(Box::new(storage));

        let saved = history.save("b", "B", "English", "Vietnamese")?;
        assert!(saved.timestamp >= future);
        assert_eq!(history.get_all()[0].id, saved.id);
        Ok(())
    }

    #[test]
    fn write_failures_propagate() {
        let existing = HistoryRecord {
            id: "keep".to_string(),
            original_text: "a".to_string(),
            translated_text: "A".to_string(),
            source_language: "English".to_string(),
            target_language: "Vietnamese".to_string(),
            timestamp: Utc::now(),
        };
        let blob = serde_json::to_string(&vec![existing]).unwrap();
        let history = HistoryStore::new(Box::new(ReadOnlyStore { blob: Some(blob) }));

        assert!(history.save("b", "B", "English", "Vietnamese").is_err());
        assert!(history.delete_item("keep").is_err());
        assert!(history.clear().is_err());
        // Reads still work
        assert_eq!(history.count(), 1);
    }

    #[test]
    fn concurrent_saves_keep_invariants() {
        let history = Arc::new(memory_history());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for i in 0..20 {
                        history
                            .save(&format!("t{} #{}", t, i), "x", "English", "Vietnamese")
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let all = history.get_all();
        assert_eq!(all.len(), MAX_HISTORY_ITEMS);
        let pairs: HashSet<_> = all.iter().map(pair_key).collect();
        assert_eq!(pairs.len(), all.len());
    }

    #[test]
    fn file_backed_history_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let saved = {
            let history = HistoryStore::new(Box::new(FileStore::new(dir.path())?));
            history.save("xin chào", "hello", "Vietnamese", "English")?
        };

        let reopened = HistoryStore::new(Box::new(FileStore::new(dir.path())?));
        assert_eq!(reopened.get_all(), vec![saved]);
        Ok(())
    }
}
