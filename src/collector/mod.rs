//! Page-side DOM collection.
//!
//! The collector runs inside the page context. On `GET_DOM_DETAILS` it walks
//! the page from the body, builds a [`NodeDescriptor`] tree and derives a
//! [`MetricsSummary`] from it, synchronously.
//!
//! # Collection Cycle
//!
//! 1. Reset the [`CollectionContext`] registry
//! 2. Pre-order walk over every node kind, registering each node
//! 3. Flatten the tree and compute metrics
//!
//! # Example
//!
//! ```
//! use dom_size_analyzer::collector::{CollectionContext, collect};
//! use dom_size_analyzer::page::Page;
//!
//! let page = Page::parse("<body><div></div><div></div><div></div></body>");
//! let mut context = CollectionContext::new();
//! let details = collect(page.collection_root(), &mut context);
//!
//! assert_eq!(details.metrics.total_nodes, 4);
//! assert_eq!(details.metrics.max_depth, 1);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Per-cycle node registry.
pub mod context;

/// Serializable node snapshots.
pub mod descriptor;

/// Aggregate metrics.
pub mod metrics;

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::page::{NodeData, Page, PageNode};
use crate::protocol::{Command, Envelope, Rejection, Reply, Source};

// ============================================================================
// Re-exports
// ============================================================================

pub use context::CollectionContext;
pub use descriptor::{ElementInfo, NodeDescriptor, NodeKind};
pub use metrics::{HeavyNode, MetricsSummary, WarningLevel};

// ============================================================================
// DomDetails
// ============================================================================

/// Result of one collection cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomDetails {
    /// The collected tree.
    pub dom: NodeDescriptor,
    /// Metrics over `dom`.
    pub metrics: MetricsSummary,
}

// ============================================================================
// Collection
// ============================================================================

/// Collects the subtree under `root`.
///
/// The context is reset first; afterwards it maps every `uniqueIndex` of the
/// result back to its live node.
pub fn collect<'a>(root: &'a PageNode, context: &mut CollectionContext<'a>) -> DomDetails {
    context.reset();

    let (dom, _) = describe(root, 0, context);
    let metrics = MetricsSummary::from_tree(&dom);

    debug!(
        total_nodes = metrics.total_nodes,
        max_depth = metrics.max_depth,
        warning_level = %metrics.warning_level,
        "Collected DOM"
    );

    DomDetails { dom, metrics }
}

/// Builds the descriptor of `node` and returns it with the number of
/// elements in the subtree, `node` included.
fn describe<'a>(
    node: &'a PageNode,
    depth: usize,
    context: &mut CollectionContext<'a>,
) -> (NodeDescriptor, usize) {
    let unique_index = context.register(node);

    let mut child_nodes = Vec::with_capacity(node.children().len());
    let mut below = 0;
    for child in node.children() {
        let (descriptor, elements) = describe(child, depth + 1, context);
        below += elements;
        child_nodes.push(descriptor);
    }

    let kind = match node.data() {
        NodeData::Element { attributes, .. } => NodeKind::Element(ElementInfo {
            tag_name: node.node_name(),
            id: node.attr("id").map(String::from),
            class: node.attr("class").map(String::from),
            attributes: attributes.clone(),
        }),
        NodeData::Text(value) => NodeKind::Text {
            value: value.clone(),
        },
        NodeData::Comment(value) => NodeKind::Comment {
            value: value.clone(),
        },
        _ => NodeKind::Other {
            node_type: node.node_type(),
            node_name: node.node_name(),
            value: node.node_value().map(String::from),
        },
    };

    let descendants_count = if node.supports_element_query() {
        below
    } else {
        0
    };

    let descriptor = NodeDescriptor {
        unique_index,
        depth,
        descendants_count,
        kind,
        child_nodes,
    };

    (descriptor, below + usize::from(node.is_element()))
}

// ============================================================================
// Collector
// ============================================================================

/// Command handler living in the page context.
///
/// Stateless: every `GET_DOM_DETAILS` uses a fresh [`CollectionContext`]
/// that is dropped when the reply is built.
#[derive(Debug, Default, Clone, Copy)]
pub struct Collector;

impl Collector {
    /// Creates a collector.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Collects the page from its default root.
    #[must_use]
    pub fn collect_page(&self, page: &Page) -> DomDetails {
        let mut context = CollectionContext::new();
        collect(page.collection_root(), &mut context)
    }

    /// Handles one page event.
    ///
    /// Returns the reply to post back, tagged `injected-script`. Events the
    /// collector posted itself are ignored. Unknown command types produce a
    /// `REJECTED` reply.
    #[must_use]
    pub fn handle(&self, page: &Page, envelope: &Envelope) -> Option<Envelope> {
        if envelope.is_from(Source::InjectedScript) {
            return None;
        }

        let reply = match Command::from_envelope(envelope) {
            Ok(Command::GetDomDetails) => Reply::DomDetails(Box::new(self.collect_page(page))),
            Ok(Command::Ping) => Reply::Pong,
            Err(rejection) => {
                warn!(command = %envelope.kind, "Rejecting unknown command");
                Reply::Rejected(rejection)
            }
        };

        let posted = reply
            .into_envelope(envelope.tab_id, envelope.id)
            .or_else(|e| {
                warn!(error = %e, "Failed to encode reply");
                Reply::Rejected(Rejection::new(envelope.kind.clone(), e.to_string()))
                    .into_envelope(envelope.tab_id, envelope.id)
            })
            .ok()?;

        Some(posted.with_src(Source::InjectedScript))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{NodeIndex, RequestId, TabId};
    use crate::protocol::GET_DOM_DETAILS;

    fn three_divs() -> Page {
        Page::from_body(
            PageNode::element("body")
                .with_child(PageNode::element("div"))
                .with_child(PageNode::element("div"))
                .with_child(PageNode::element("div")),
        )
    }

    #[test]
    fn test_flat_body_scenario() {
        let page = three_divs();
        let details = Collector::new().collect_page(&page);
        let metrics = &details.metrics;

        assert_eq!(metrics.total_nodes, 4);
        assert_eq!(metrics.max_depth, 1);
        assert_eq!(metrics.tag_counts.get("div"), Some(&3));
        assert_eq!(metrics.tag_counts.get("body"), Some(&1));
        assert_eq!(metrics.tag_counts.len(), 2);
        assert_eq!(metrics.inline_style_count, 0);
        assert_eq!(metrics.warning_level, WarningLevel::Nominal);
        assert_eq!(details.dom.descendants_count, 3);
        assert_eq!(details.dom.depth, 0);
    }

    #[test]
    fn test_text_and_comment_nodes_are_visited() {
        let page = Page::from_body(
            PageNode::element("body")
                .with_child(PageNode::text("\n  "))
                .with_child(PageNode::comment("marker"))
                .with_child(PageNode::element("p").with_child(PageNode::text("hello"))),
        );

        let details = Collector::new().collect_page(&page);
        let flat = details.dom.flatten();

        assert_eq!(flat.len(), 5);
        assert_eq!(details.dom.descendants_count, 1);
        assert_eq!(details.metrics.tag_counts.get("#text"), Some(&2));
        assert_eq!(details.metrics.tag_counts.get("#comment"), Some(&1));
        assert_eq!(flat[4].depth, 2);
        assert_eq!(flat[4].descendants_count, 0);
    }

    #[test]
    fn test_attributes_and_heavy_nodes() {
        let page = Page::from_body(
            PageNode::element("body")
                .with_child(
                    PageNode::element("ul")
                        .with_attr("id", "menu")
                        .with_attr("class", "nav main")
                        .with_attr("style", "color:red")
                        .with_children((0..3).map(|_| PageNode::element("li"))),
                )
                .with_child(
                    PageNode::element("section")
                        .with_child(PageNode::element("p").with_attr("style", "x"))
                        .with_child(PageNode::element("p")),
                ),
        );

        let details = Collector::new().collect_page(&page);
        let metrics = &details.metrics;

        assert_eq!(metrics.inline_style_count, 2);
        assert_eq!(metrics.total_attributes, 4);

        let heavy: Vec<_> = metrics
            .heavy_nodes_top
            .iter()
            .map(|h| (h.description.as_str(), h.descendants_count))
            .collect();
        assert_eq!(
            heavy,
            [("BODY", 7), ("UL#menu.nav.main", 3), ("SECTION", 2)]
        );
    }

    #[test]
    fn test_heavy_nodes_capped_and_ties_in_visit_order() {
        let body = PageNode::element("body").with_children(
            (0..12).map(|i| {
                PageNode::element("div")
                    .with_attr("id", format!("d{i}"))
                    .with_child(PageNode::element("span"))
            }),
        );
        let details = Collector::new().collect_page(&Page::from_body(body));
        let heavy = &details.metrics.heavy_nodes_top;

        assert_eq!(heavy.len(), 10);
        assert_eq!(heavy[0].description, "BODY");
        assert_eq!(heavy[1].description, "DIV#d0");
        assert_eq!(heavy[9].description, "DIV#d8");
    }

    #[test]
    fn test_context_resolves_indices() {
        let page = three_divs();
        let root = page.collection_root();
        let mut context = CollectionContext::new();
        let details = collect(root, &mut context);

        assert_eq!(context.len(), details.metrics.total_nodes);
        let second = context.resolve(NodeIndex::new(2)).expect("registered");
        assert!(std::ptr::eq(second, &root.children()[1]));
    }

    #[test]
    fn test_document_root_counts_elements() {
        let page = Page::new(
            PageNode::document()
                .with_child(PageNode::doctype("html"))
                .with_child(PageNode::element("svg").with_child(PageNode::element("g"))),
        );
        let mut context = CollectionContext::new();
        let details = collect(page.document(), &mut context);

        assert_eq!(details.dom.descendants_count, 2);
        assert_eq!(details.dom.node_type(), 9);
        assert_eq!(details.dom.child_nodes[0].descendants_count, 0);
    }

    #[test]
    fn test_handle_get_dom_details() {
        let tab_id = TabId::new(4).expect("valid tab id");
        let id = RequestId::generate();
        let request = Command::GetDomDetails
            .into_envelope(tab_id, id)
            .with_src(Source::ContentScript);

        let reply = Collector::new()
            .handle(&three_divs(), &request)
            .expect("reply");

        assert_eq!(reply.kind, GET_DOM_DETAILS);
        assert_eq!(reply.tab_id, Some(tab_id));
        assert_eq!(reply.id, Some(id));
        assert!(reply.is_from(Source::InjectedScript));

        match Reply::from_envelope(reply).expect("decode") {
            Reply::DomDetails(details) => assert_eq!(details.metrics.total_nodes, 4),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_handle_ping_and_unknown() {
        let collector = Collector::new();
        let page = three_divs();

        let pong = collector
            .handle(&page, &Envelope::new("ping", None))
            .expect("pong");
        assert_eq!(Reply::from_envelope(pong).expect("decode"), Reply::Pong);

        let rejected = collector
            .handle(&page, &Envelope::new("SCROLL_TO", None))
            .expect("rejection");
        assert_eq!(
            Reply::from_envelope(rejected).expect("decode"),
            Reply::Rejected(Rejection::unknown_command("SCROLL_TO"))
        );
    }

    #[test]
    fn test_handle_ignores_own_posts() {
        let own = Envelope::new("ping", None).with_src(Source::InjectedScript);
        assert!(Collector::new().handle(&three_divs(), &own).is_none());
    }
}
