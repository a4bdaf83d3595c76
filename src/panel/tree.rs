//! Filterable tree model of a collected DOM.
//!
//! A node is shown when it has descendant elements or at least one shown
//! child, and when it matches the filter or has a matching descendant. Leaf
//! elements and character data are therefore never shown on their own.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::collector::NodeDescriptor;
use crate::identifiers::NodeIndex;

// ============================================================================
// Heaviness
// ============================================================================

/// Visual weight of a node by descendant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Heaviness {
    /// Below 80 descendants.
    Baseline,
    /// 80 or more.
    Medium,
    /// 300 or more.
    High,
    /// 1000 or more.
    Critical,
}

impl Heaviness {
    /// Classifies a descendant count.
    #[must_use]
    pub fn from_descendants(count: usize) -> Self {
        match count {
            1000.. => Self::Critical,
            300.. => Self::High,
            80.. => Self::Medium,
            _ => Self::Baseline,
        }
    }

    /// Stylesheet class of the tier.
    #[inline]
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Baseline => "hx-green",
            Self::Medium => "hx-yellow",
            Self::High => "hx-orange",
            Self::Critical => "hx-red",
        }
    }
}

// ============================================================================
// TreeFilter
// ============================================================================

/// Text query and exact tag filter; both may be active.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeFilter {
    query: String,
    tag: Option<String>,
}

impl TreeFilter {
    /// Creates a filter that matches everything.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the case-insensitive substring query over tag, id and class.
    #[must_use]
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.trim().to_lowercase();
        self
    }

    /// Sets the exact tag filter (compared lower-cased).
    #[must_use]
    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag.map(str::to_lowercase);
        self
    }

    /// Returns `true` if neither filter is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.tag.is_none()
    }

    /// Returns `true` if the node itself satisfies the filter.
    #[must_use]
    pub fn matches(&self, node: &NodeDescriptor) -> bool {
        let tag = node.tag_name().unwrap_or_default().to_lowercase();

        if let Some(wanted) = &self.tag
            && tag != *wanted
        {
            return false;
        }

        if self.query.is_empty() {
            return true;
        }

        let haystack = format!(
            "{}{}{}",
            tag,
            node.id().unwrap_or_default().to_lowercase(),
            node.class().unwrap_or_default().to_lowercase()
        );
        haystack.contains(&self.query)
    }
}

// ============================================================================
// TreeItem
// ============================================================================

/// One shown node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeItem {
    /// Back-reference to the descriptor.
    pub unique_index: NodeIndex,
    /// `tag#id.class` label.
    pub label: String,
    /// Descendant element count.
    pub descendants_count: usize,
    /// Visual weight.
    pub heaviness: Heaviness,
    /// The descriptor has children (shown or not).
    pub has_children: bool,
    /// Children are displayed.
    pub expanded: bool,
    /// Shown children.
    pub children: Vec<TreeItem>,
}

impl TreeItem {
    /// Number of items in this subtree.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeItem::count).sum::<usize>()
    }

    /// Finds an item by index.
    #[must_use]
    pub fn find(&self, index: NodeIndex) -> Option<&TreeItem> {
        if self.unique_index == index {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(index))
    }

    fn marker(&self) -> &'static str {
        match (self.has_children, self.expanded) {
            (false, _) => "•",
            (true, true) => "▾",
            (true, false) => "▸",
        }
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{} {} ({} desc)",
            "",
            self.marker(),
            self.label,
            self.descendants_count,
            indent = level * 2
        )?;
        if self.expanded {
            for child in &self.children {
                child.write_outline(f, level + 1)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TreeItem {
    /// Outline of the visible items, collapsed subtrees hidden.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, 0)
    }
}

// ============================================================================
// Building
// ============================================================================

/// Builds the shown tree, or `None` if nothing is shown.
///
/// Items whose index is in `expanded` display their children.
#[must_use]
pub fn build_tree(
    root: &NodeDescriptor,
    filter: &TreeFilter,
    expanded: &FxHashSet<NodeIndex>,
) -> Option<TreeItem> {
    let children: Vec<TreeItem> = root
        .child_nodes
        .iter()
        .filter_map(|child| build_tree(child, filter, expanded))
        .collect();
    let child_match = !children.is_empty();

    if root.descendants_count == 0 && !child_match {
        return None;
    }
    if !child_match && !filter.matches(root) {
        return None;
    }

    Some(TreeItem {
        unique_index: root.unique_index,
        label: root.description(),
        descendants_count: root.descendants_count,
        heaviness: Heaviness::from_descendants(root.descendants_count),
        has_children: !root.child_nodes.is_empty(),
        expanded: expanded.contains(&root.unique_index),
        children,
    })
}

// ============================================================================
// Tests
// ============================================================================
