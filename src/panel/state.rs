//! Panel UI state, independent of any transport.
//!
//! [`PanelState`] holds everything the panel shows: the analyze button, the
//! loaded tree and metrics, filters, selection, expansion and the snapshot
//! history. The async [`Panel`](super::Panel) drives it from relay replies.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::collector::{DomDetails, MetricsSummary, NodeDescriptor};
use crate::error::Result;
use crate::identifiers::NodeIndex;
use crate::protocol::Command;

use super::export;
use super::history::{Snapshot, SnapshotDiff, SnapshotHistory};
use super::tree::{TreeFilter, TreeItem, build_tree};
use super::view::MetricsView;

// ============================================================================
// AnalyzeButton
// ============================================================================

/// State of the analyze button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzeButton {
    /// Nothing loaded.
    #[default]
    Analyze,
    /// A request is in flight.
    Loading,
    /// A tree is loaded; the next click clears it.
    Reset,
}

impl AnalyzeButton {
    /// Button caption.
    #[inline]
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Analyze => "Analyze DOM",
            Self::Loading => "Loading...",
            Self::Reset => "Reset",
        }
    }
}

impl fmt::Display for AnalyzeButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a click on the analyze button asks the caller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeAction {
    /// A request is in flight; nothing to do.
    Ignored,
    /// The loaded tree was cleared; nothing to send.
    Cleared,
    /// Send this command.
    Send(Command),
}

// ============================================================================
// PanelState
// ============================================================================

/// Everything the panel displays.
#[derive(Debug, Clone)]
pub struct PanelState {
    button: AnalyzeButton,
    dom: Option<NodeDescriptor>,
    metrics: Option<MetricsSummary>,
    query: String,
    tag_filter: Option<String>,
    selected: Option<NodeIndex>,
    expanded: FxHashSet<NodeIndex>,
    all_expanded: bool,
    history: SnapshotHistory,
}

impl PanelState {
    /// Creates an empty state keeping up to `history_capacity` snapshots.
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        Self {
            button: AnalyzeButton::Analyze,
            dom: None,
            metrics: None,
            query: String::new(),
            tag_filter: None,
            selected: None,
            expanded: FxHashSet::default(),
            all_expanded: false,
            history: SnapshotHistory::new(history_capacity),
        }
    }

    /// Analyze button state.
    #[inline]
    #[must_use]
    pub fn button(&self) -> AnalyzeButton {
        self.button
    }

    /// Returns `true` while a request awaits its reply.
    #[inline]
    #[must_use]
    pub fn is_inflight(&self) -> bool {
        self.button == AnalyzeButton::Loading
    }

    /// The loaded tree.
    #[inline]
    #[must_use]
    pub fn dom(&self) -> Option<&NodeDescriptor> {
        self.dom.as_ref()
    }

    /// Metrics of the loaded tree.
    #[inline]
    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsSummary> {
        self.metrics.as_ref()
    }

    /// Current search query, as typed.
    #[inline]
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Active tag filter.
    #[inline]
    #[must_use]
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag_filter.as_deref()
    }

    /// Selected node, if any.
    #[inline]
    #[must_use]
    pub fn selected(&self) -> Option<NodeIndex> {
        self.selected
    }

    /// Recorded snapshots.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &SnapshotHistory {
        &self.history
    }
}

// ============================================================================
// PanelState - Analyze Cycle
// ============================================================================

impl PanelState {
    /// Handles a click on the analyze button.
    pub fn click_analyze(&mut self) -> AnalyzeAction {
        match self.button {
            AnalyzeButton::Loading => AnalyzeAction::Ignored,
            AnalyzeButton::Reset => {
                self.dom = None;
                self.metrics = None;
                self.selected = None;
                self.expanded.clear();
                self.button = AnalyzeButton::Analyze;
                debug!("Panel reset");
                AnalyzeAction::Cleared
            }
            AnalyzeButton::Analyze => {
                self.tag_filter = None;
                self.button = AnalyzeButton::Loading;
                AnalyzeAction::Send(Command::GetDomDetails)
            }
        }
    }

    /// Loads a `GET_DOM_DETAILS` result.
    pub fn receive_details(&mut self, details: DomDetails) {
        debug!(
            total_nodes = details.metrics.total_nodes,
            max_depth = details.metrics.max_depth,
            "Panel received DOM details"
        );

        self.dom = Some(details.dom);
        self.metrics = Some(details.metrics);
        self.selected = None;
        self.expanded.clear();
        self.all_expanded = false;
        self.button = AnalyzeButton::Reset;
    }

    /// Leaves the loading state after a failed request.
    pub fn fail_inflight(&mut self) {
        if self.is_inflight() {
            self.button = if self.dom.is_some() {
                AnalyzeButton::Reset
            } else {
                AnalyzeButton::Analyze
            };
        }
    }
}

// ============================================================================
// PanelState - Tree Interaction
// ============================================================================

impl PanelState {
    /// Sets the search query; clears the tag filter.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.tag_filter = None;
    }

    /// Toggles the exact tag filter; clears the search query.
    pub fn toggle_tag_filter(&mut self, tag: &str) {
        self.tag_filter = match self.tag_filter.as_deref() {
            Some(current) if current == tag => None,
            _ => Some(tag.to_owned()),
        };
        self.query.clear();
    }

    /// The active filter.
    #[must_use]
    pub fn filter(&self) -> TreeFilter {
        TreeFilter::new()
            .with_query(&self.query)
            .with_tag(self.tag_filter.as_deref())
    }

    /// Selects a node of the loaded tree.
    ///
    /// Returns `false` if no loaded node has that index.
    pub fn select(&mut self, index: NodeIndex) -> bool {
        let found = self.dom.as_ref().is_some_and(|dom| dom.find(index).is_some());
        if found {
            self.selected = Some(index);
        }
        found
    }

    /// Expands or collapses one node, returning whether it is now expanded.
    pub fn toggle_node(&mut self, index: NodeIndex) -> bool {
        if self.expanded.remove(&index) {
            false
        } else {
            self.expanded.insert(index);
            true
        }
    }

    /// Selects a node and toggles its expansion.
    pub fn click_node(&mut self, index: NodeIndex) -> bool {
        self.select(index) && self.toggle_node(index)
    }

    /// Alternately expands and collapses every node.
    pub fn toggle_collapse_all(&mut self) {
        self.expanded.clear();
        if !self.all_expanded
            && let Some(dom) = &self.dom
        {
            self.expanded.extend(
                dom.flatten()
                    .into_iter()
                    .filter(|n| !n.child_nodes.is_empty())
                    .map(|n| n.unique_index),
            );
        }
        self.all_expanded = !self.all_expanded;
    }

    /// The shown tree under the active filter.
    #[must_use]
    pub fn tree(&self) -> Option<TreeItem> {
        let dom = self.dom.as_ref()?;
        build_tree(dom, &self.filter(), &self.expanded)
    }

    /// The metrics pane.
    #[must_use]
    pub fn metrics_view(&self) -> MetricsView {
        match &self.metrics {
            Some(metrics) => MetricsView::new(metrics, self.dom.as_ref(), self.tag_filter()),
            None => MetricsView::empty(),
        }
    }
}

// ============================================================================
// PanelState - History
// ============================================================================

impl PanelState {
    /// Records a snapshot of the loaded tree.
    ///
    /// Returns `None` when nothing is loaded.
    pub fn snapshot(&mut self) -> Option<&Snapshot> {
        let snapshot = Snapshot::of_tree(self.dom.as_ref()?);
        self.history.push(snapshot);
        self.history.iter().last()
    }

    /// Compares the two most recent snapshots.
    #[must_use]
    pub fn compare(&self) -> Option<SnapshotDiff> {
        self.history.compare_latest()
    }

    /// Drops every snapshot.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// History view lines.
    #[must_use]
    pub fn history_lines(&self) -> Vec<String> {
        self.history.lines()
    }
}

// ============================================================================
// PanelState - Export
// ============================================================================

impl PanelState {
    /// JSON export of the loaded tree, `None` when nothing is loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<Option<String>> {
        self.dom.as_ref().map(export::to_json).transpose()
    }

    /// CSV export of the loaded tree, `None` when nothing is loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub async fn export_csv(&self) -> Result<Option<String>> {
        match &self.dom {
            Some(dom) => export::to_csv(dom).await.map(Some),
            None => Ok(None),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
