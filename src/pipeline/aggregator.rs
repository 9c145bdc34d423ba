//! Per-author activity counting
//!
//! Entries are stored in first-seen order so the ranker's stable sort breaks
//! ties by which author appeared first in the stream. Display attributes are
//! overwritten on every record: the profile snapshot reflects the most recent
//! observed activity.

use super::types::{ActivityEntry, Record};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ActivityAggregator {
    /// author_id -> index into `entries`
    index: HashMap<u64, usize>,
    entries: Vec<ActivityEntry>,
    skipped_without_author: u64,
}

impl ActivityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record. Records without an author id are skipped.
    pub fn add(&mut self, record: &Record) {
        let Some(author_id) = record.author_id else {
            self.skipped_without_author += 1;
            return;
        };

        let idx = match self.index.get(&author_id) {
            Some(&idx) => idx,
            None => {
                self.entries.push(ActivityEntry::new(author_id));
                self.index.insert(author_id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[idx];
        entry.display_name.clone_from(&record.author_name);
        entry.avatar_url.clone_from(&record.author_avatar_url);
        entry.count += 1;
    }

    pub fn extend<'a>(&mut self, records: impl IntoIterator<Item = &'a Record>) {
        for record in records {
            self.add(record);
        }
    }

    pub fn get(&self, author_id: u64) -> Option<&ActivityEntry> {
        self.index.get(&author_id).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn skipped_without_author(&self) -> u64 {
        self.skipped_without_author
    }

    /// Entries in first-seen order
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ActivityEntry> {
        self.entries
    }
}
