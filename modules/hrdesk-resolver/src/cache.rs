//! Option lists keyed by (stage, concrete prefix).
//!
//! Session-scoped and unbounded: the prefix space of a selector chain is
//! small, entries are only ever overwritten by a newer successful fetch.

use std::collections::HashMap;

use crate::stage::Selection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub options: Vec<String>,
    /// Selection applied when the list arrived.
    pub default: Selection,
}

#[derive(Debug, Default)]
pub struct OptionCache {
    stages: HashMap<usize, HashMap<Vec<String>, CacheEntry>>,
}

impl OptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, stage: usize, prefix: &[String]) -> Option<&CacheEntry> {
        self.stages.get(&stage)?.get(prefix)
    }

    /// Last write wins.
    pub fn put(&mut self, stage: usize, prefix: Vec<String>, options: Vec<String>, default: Selection) {
        self.stages
            .entry(stage)
            .or_default()
            .insert(prefix, CacheEntry { options, default });
    }

    pub fn len(&self) -> usize {
        self.stages.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
