use std::collections::VecDeque;

use crate::types::HistoryEntry;

/// Remixes produced during one session, most recent first.
///
/// Owned by the presentation layer. Entries are only ever added.
#[derive(Clone, Debug, Default)]
pub struct RemixHistory {
    entries: VecDeque<HistoryEntry>,
}

impl RemixHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
