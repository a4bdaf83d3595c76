//! Snapshot history and comparison.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collector::NodeDescriptor;

// ============================================================================
// Snapshot
// ============================================================================

/// Size of the analyzed tree at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Node count of the tree.
    pub total_nodes: usize,
    /// Largest depth of the tree.
    pub max_depth: usize,
}

impl Snapshot {
    /// Snapshots a tree now.
    #[must_use]
    pub fn of_tree(dom: &NodeDescriptor) -> Self {
        let flat = dom.flatten();
        Self {
            timestamp: Utc::now(),
            total_nodes: flat.len(),
            max_depth: flat.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }
}

// ============================================================================
// SnapshotDiff
// ============================================================================

/// Difference between two snapshots, newer minus older.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDiff {
    /// Change in node count.
    pub nodes_diff: i64,
    /// Change in depth.
    pub depth_diff: i64,
}

impl SnapshotDiff {
    /// Computes `newer - older`.
    #[must_use]
    pub fn between(older: &Snapshot, newer: &Snapshot) -> Self {
        Self {
            nodes_diff: signed(newer.total_nodes) - signed(older.total_nodes),
            depth_diff: signed(newer.max_depth) - signed(older.max_depth),
        }
    }
}

impl fmt::Display for SnapshotDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compare last two snapshots:\n\nNodes diff: {}\nDepth diff: {}",
            self.nodes_diff, self.depth_diff
        )
    }
}

fn signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ============================================================================
// SnapshotHistory
// ============================================================================

/// Bounded FIFO of snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    entries: VecDeque<Snapshot>,
    capacity: usize,
}

impl SnapshotHistory {
    /// Creates an empty history.
    ///
    /// A zero capacity is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a snapshot, evicting the oldest when full.
    pub fn push(&mut self, snapshot: Snapshot) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Compares the two most recent snapshots.
    ///
    /// Returns `None` with fewer than two snapshots.
    #[must_use]
    pub fn compare_latest(&self) -> Option<SnapshotDiff> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }
        Some(SnapshotDiff::between(
            &self.entries[len - 2],
            &self.entries[len - 1],
        ))
    }

    /// Removes every snapshot.
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    /// Number of snapshots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no snapshots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of snapshots kept.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// One line per snapshot: `#N nodes:X depth:Y`.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, s)| format!("#{} nodes:{} depth:{}", i + 1, s.total_nodes, s.max_depth))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
