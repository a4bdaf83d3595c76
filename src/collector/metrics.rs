//! Aggregate metrics over one collected tree.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::NodeIndex;

use super::descriptor::NodeDescriptor;

// ============================================================================
// Constants
// ============================================================================

/// Number of entries kept in [`MetricsSummary::heavy_nodes_top`].
pub const HEAVY_NODES_LIMIT: usize = 10;

/// Node count above which the page is critical.
pub const CRITICAL_TOTAL_NODES: usize = 1500;
/// Depth above which the page is critical.
pub const CRITICAL_MAX_DEPTH: usize = 25;
/// Inline style count above which the page is critical.
pub const CRITICAL_INLINE_STYLES: usize = 200;

/// Node count above which the page is elevated.
pub const ELEVATED_TOTAL_NODES: usize = 800;
/// Depth above which the page is elevated.
pub const ELEVATED_MAX_DEPTH: usize = 18;
/// Inline style count above which the page is elevated.
pub const ELEVATED_INLINE_STYLES: usize = 100;

// ============================================================================
// WarningLevel
// ============================================================================

/// Coarse page health signal, serialized as `0`, `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WarningLevel {
    /// Within all limits.
    #[default]
    Nominal = 0,
    /// At least one elevated limit exceeded.
    Elevated = 1,
    /// At least one critical limit exceeded.
    Critical = 2,
}

impl WarningLevel {
    /// Classifies a page from its aggregate counts.
    #[must_use]
    pub fn classify(total_nodes: usize, max_depth: usize, inline_style_count: usize) -> Self {
        if total_nodes > CRITICAL_TOTAL_NODES
            || max_depth > CRITICAL_MAX_DEPTH
            || inline_style_count > CRITICAL_INLINE_STYLES
        {
            Self::Critical
        } else if total_nodes > ELEVATED_TOTAL_NODES
            || max_depth > ELEVATED_MAX_DEPTH
            || inline_style_count > ELEVATED_INLINE_STYLES
        {
            Self::Elevated
        } else {
            Self::Nominal
        }
    }
}

impl From<WarningLevel> for u8 {
    #[inline]
    fn from(level: WarningLevel) -> Self {
        level as u8
    }
}

impl TryFrom<u8> for WarningLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nominal),
            1 => Ok(Self::Elevated),
            2 => Ok(Self::Critical),
            other => Err(format!("warning level out of range: {other}")),
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Nominal => "ok",
            Self::Elevated => "warning",
            Self::Critical => "critical",
        };
        f.write_str(label)
    }
}

// ============================================================================
// HeavyNode
// ============================================================================

/// Entry of the heaviest-nodes list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeavyNode {
    /// `tag#id.class` label.
    #[serde(alias = "desc")]
    pub description: String,
    /// Descendant element count.
    pub descendants_count: usize,
    /// Back-reference into the collection cycle.
    pub unique_index: NodeIndex,
}

// ============================================================================
// MetricsSummary
// ============================================================================

/// Read-only metrics derived from one collected tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// Number of nodes in the tree.
    pub total_nodes: usize,
    /// Largest `depth`.
    pub max_depth: usize,
    /// Lower-cased tag/node name → count.
    pub tag_counts: BTreeMap<String, usize>,
    /// Nodes carrying a `style` attribute.
    pub inline_style_count: usize,
    /// Sum of attribute counts.
    pub total_attributes: usize,
    /// Heaviest nodes, descending.
    pub heavy_nodes_top: Vec<HeavyNode>,
    /// Health signal.
    pub warning_level: WarningLevel,
}

impl MetricsSummary {
    /// Computes the metrics of a tree.
    #[must_use]
    pub fn from_tree(root: &NodeDescriptor) -> Self {
        Self::from_flat(&root.flatten())
    }

    /// Computes the metrics from a pre-order flattening.
    #[must_use]
    pub fn from_flat(flat: &[&NodeDescriptor]) -> Self {
        let total_nodes = flat.len();
        let max_depth = flat.iter().map(|n| n.depth).max().unwrap_or(0);
        let inline_style_count = flat.iter().filter(|n| n.has_attribute("style")).count();
        let total_attributes = flat.iter().map(|n| n.attributes().len()).sum();

        let mut tag_counts = BTreeMap::new();
        for node in flat {
            let tag = node
                .tag_name()
                .unwrap_or(node.node_name())
                .to_lowercase();
            if !tag.is_empty() {
                *tag_counts.entry(tag).or_insert(0) += 1;
            }
        }

        let mut heavy: Vec<&NodeDescriptor> = flat
            .iter()
            .copied()
            .filter(|n| n.descendants_count > 0)
            .collect();
        // Stable sort keeps visitation order among equals.
        heavy.sort_by(|a, b| b.descendants_count.cmp(&a.descendants_count));
        let heavy_nodes_top = heavy
            .into_iter()
            .take(HEAVY_NODES_LIMIT)
            .map(|n| HeavyNode {
                description: n.description(),
                descendants_count: n.descendants_count,
                unique_index: n.unique_index,
            })
            .collect();

        Self {
            total_nodes,
            max_depth,
            tag_counts,
            inline_style_count,
            total_attributes,
            heavy_nodes_top,
            warning_level: WarningLevel::classify(total_nodes, max_depth, inline_style_count),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
