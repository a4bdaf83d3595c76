//! Per-cycle node registry.

use crate::identifiers::NodeIndex;
use crate::page::PageNode;

// ============================================================================
// CollectionContext
// ============================================================================

/// Registry of the live nodes visited by one collection cycle.
///
/// `NodeIndex` values handed out by a context are positions in its
/// registry. The context borrows the page, so indices can only be resolved
/// while the page is unchanged.
#[derive(Debug, Default)]
pub struct CollectionContext<'a> {
    registry: Vec<&'a PageNode>,
}

impl<'a> CollectionContext<'a> {
    /// Creates an empty context.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Vec::new(),
        }
    }

    /// Empties the registry.
    #[inline]
    pub fn reset(&mut self) {
        self.registry.clear();
    }

    /// Records a node and returns its index.
    #[inline]
    pub(crate) fn register(&mut self, node: &'a PageNode) -> NodeIndex {
        self.registry.push(node);
        NodeIndex::new(self.registry.len() - 1)
    }

    /// Returns the live node for an index of this cycle.
    #[inline]
    #[must_use]
    pub fn resolve(&self, index: NodeIndex) -> Option<&'a PageNode> {
        self.registry.get(index.get()).copied()
    }

    /// Number of registered nodes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if nothing has been registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
