#![forbid(unsafe_code)]

use std::collections::BTreeMap;

pub const TOPIC_TASKS: &str = "tasks";
pub const TOPIC_SCHEDULES: &str = "schedules";
pub const TOPIC_INTERVAL_TASKS: &str = "interval_tasks";
pub const TOPIC_DAILY_ENTRIES: &str = "daily_entries";

/// Per-topic mutation counter for live-update fanout.
///
/// Owned by the embedding process and created once at startup; the caller
/// bumps the topic after each successful mutation and broadcasts the returned
/// sequence number. Sequences start at zero and only ever grow.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    seqs: BTreeMap<String, u64>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump(&mut self, topic: &str) -> u64 {
        let seq = self.seqs.entry(topic.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    pub fn current(&self, topic: &str) -> u64 {
        self.seqs.get(topic).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequences_grow_per_topic() {
        let mut feed = ChangeFeed::new();
        assert_eq!(feed.current(TOPIC_TASKS), 0);
        assert_eq!(feed.bump(TOPIC_TASKS), 1);
        assert_eq!(feed.bump(TOPIC_TASKS), 2);
        assert_eq!(feed.bump(TOPIC_SCHEDULES), 1);
        assert_eq!(feed.current(TOPIC_TASKS), 2);
        assert_eq!(feed.current(TOPIC_SCHEDULES), 1);
    }
}
