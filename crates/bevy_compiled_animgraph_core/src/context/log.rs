use std::{collections::VecDeque, fmt};

use bevy::log::warn;

use crate::ids::NodeIndex;

#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeLogEntry {
    pub node_index: NodeIndex,
    pub update_id: u64,
    pub message: String,
}

static NO_ENTRIES: VecDeque<RuntimeLogEntry> = VecDeque::new();

/// Destination of runtime warnings. Algorithms log through this unconditionally; whether
/// anything is kept depends on which sink the instance was built with.
pub trait GraphLogSink: Send + Sync {
    fn log_warning(&mut self, node_index: NodeIndex, update_id: u64, message: fmt::Arguments);

    /// Oldest first
    fn entries(&self) -> &VecDeque<RuntimeLogEntry> {
        &NO_ENTRIES
    }

    fn clear(&mut self) {}
}

/// Keeps the most recent warnings and mirrors them to the bevy log.
#[derive(Debug, Clone)]
pub struct DevelopmentLog {
    entries: VecDeque<RuntimeLogEntry>,
    max_entries: usize,
}

impl DevelopmentLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }
}

impl GraphLogSink for DevelopmentLog {
    fn log_warning(&mut self, node_index: NodeIndex, update_id: u64, message: fmt::Arguments) {
        let message = message.to_string();
        warn!("Animation graph node {node_index}: {message}");

        if self.max_entries == 0 {
            return;
        }
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(RuntimeLogEntry {
            node_index,
            update_id,
            message,
        });
    }

    fn entries(&self) -> &VecDeque<RuntimeLogEntry> {
        &self.entries
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLog;

impl GraphLogSink for NoopLog {
    fn log_warning(&mut self, _: NodeIndex, _: u64, _: fmt::Arguments) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_log_keeps_most_recent_entries() {
        let mut log = DevelopmentLog::new(2);
        for i in 0..3 {
            log.log_warning(NodeIndex(i), 7, format_args!("warning {i}"));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "warning 1");
        assert_eq!(entries[1].node_index, NodeIndex(2));
        assert_eq!(entries[1].update_id, 7);
    }

    #[test]
    fn full_development_log_rotates_without_growing() {
        let mut log = DevelopmentLog::new(3);
        for i in 0..10 {
            log.log_warning(NodeIndex(i), i as u64, format_args!("warning {i}"));
        }
        let capacity = log.entries.capacity();
        log.log_warning(NodeIndex(10), 10, format_args!("warning 10"));

        assert_eq!(log.entries.capacity(), capacity);
        let update_ids: Vec<u64> = log.entries().iter().map(|entry| entry.update_id).collect();
        assert_eq!(update_ids, [8, 9, 10]);
    }

    #[test]
    fn noop_log_keeps_nothing() {
        let mut log = NoopLog;
        log.log_warning(NodeIndex(0), 0, format_args!("ignored"));
        assert!(log.entries().is_empty());
    }
}
