//! Metrics view model.

use serde::Serialize;

use crate::collector::{HeavyNode, MetricsSummary, NodeDescriptor, WarningLevel};

// ============================================================================
// Constants
// ============================================================================

/// Number of tags shown in the distribution.
pub const TAG_VIEW_LIMIT: usize = 12;

/// Node count at which the status gauge is full.
pub const STATUS_NODE_CEILING: usize = 15_000;

// ============================================================================
// TagEntry
// ============================================================================

/// One entry of the tag distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagEntry {
    /// Lower-case tag name.
    pub tag: String,
    /// Elements with this tag.
    pub count: usize,
    /// This tag is the active tag filter.
    pub active: bool,
}

// ============================================================================
// MetricsView
// ============================================================================

/// Display values of the metrics pane.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsView {
    /// Total-nodes KPI.
    ///
    /// With a tree loaded this is the root's descendant element count;
    /// otherwise the summary's node count.
    pub total_nodes: usize,
    /// Deepest node depth below the root.
    pub max_depth: usize,
    /// Elements carrying a `style` attribute.
    pub inline_style_count: usize,
    /// Attributes summed over all elements.
    pub total_attributes: usize,
    /// Gauge position, `min(total / 15000, 1) * 100`.
    pub status_percent: f64,
    /// Most frequent tags, descending.
    pub tags: Vec<TagEntry>,
    /// Heaviest nodes, as collected.
    pub heavy_nodes: Vec<HeavyNode>,
    /// Severity shown in the status card.
    pub warning_level: WarningLevel,
}

impl MetricsView {
    /// The view with nothing analyzed.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(&MetricsSummary::default(), None, None)
    }

    /// Builds the view of `metrics`.
    #[must_use]
    pub fn new(
        metrics: &MetricsSummary,
        dom: Option<&NodeDescriptor>,
        active_tag: Option<&str>,
    ) -> Self {
        let mut tags: Vec<(&String, &usize)> = metrics.tag_counts.iter().collect();
        tags.sort_by(|a, b| b.1.cmp(a.1));

        let tags = tags
            .into_iter()
            .take(TAG_VIEW_LIMIT)
            .map(|(tag, count)| TagEntry {
                tag: tag.clone(),
                count: *count,
                active: active_tag == Some(tag.as_str()),
            })
            .collect();

        Self {
            total_nodes: dom.map_or(metrics.total_nodes, |d| d.descendants_count),
            max_depth: metrics.max_depth,
            inline_style_count: metrics.inline_style_count,
            total_attributes: metrics.total_attributes,
            status_percent: status_percent(metrics.total_nodes),
            tags,
            heavy_nodes: metrics.heavy_nodes_top.clone(),
            warning_level: metrics.warning_level,
        }
    }
}

/// Fill of the status gauge for a node count.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn status_percent(total_nodes: usize) -> f64 {
    (total_nodes as f64 / STATUS_NODE_CEILING as f64).min(1.0) * 100.0
}

// ============================================================================
// Tests
// ============================================================================
