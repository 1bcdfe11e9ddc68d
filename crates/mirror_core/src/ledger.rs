use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::PageId;

/// In-memory record of the `last_edited_time` each page had when it was last
/// rendered. Starts empty on every process start; nothing is persisted, so a
/// restart re-exports every publishable page once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: HashMap<PageId, DateTime<Utc>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the page has never been recorded or was edited since.
    pub fn needs_render(&self, page_id: &str, last_edited: DateTime<Utc>) -> bool {
        self.entries.get(page_id) != Some(&last_edited)
    }

    /// Records a render attempt, whatever its outcome.
    pub fn record(&mut self, page_id: impl Into<PageId>, last_edited: DateTime<Utc>) {
        self.entries.insert(page_id.into(), last_edited);
    }

    pub fn get(&self, page_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(page_id).copied()
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
    use super::Ledger;
    use chrono::{TimeZone, Utc};

    #[test]
    fn absent_or_changed_entries_need_render() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut ledger = Ledger::new();

        assert!(ledger.needs_render("p", t1));
        ledger.record("p", t1);
        assert!(!ledger.needs_render("p", t1));
        assert!(ledger.needs_render("p", t2));
        // An older timestamp is still a difference.
        ledger.record("p", t2);
        assert!(ledger.needs_render("p", t1));
        assert_eq!(ledger.get("p"), Some(t2));
        assert_eq!(ledger.len(), 1);
    }
}
