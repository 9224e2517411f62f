//! Ranked, time-windowed view over stored records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{Record, Summary};
use crate::filter::TimeWindow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub window: TimeWindow,
    /// Up to N records, best first.
    pub records: Vec<Record>,
    /// Current summary per record id, where one exists.
    pub summaries: BTreeMap<String, Summary>,
    /// Every record that fell inside the window, not just the selected ones.
    pub total_reviewed: usize,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary_for(&self, record: &Record) -> Option<&Summary> {
        self.summaries.get(&record.id)
    }
}
