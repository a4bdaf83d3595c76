//! In-memory model of the inspected page.
//!
//! The collector walks a [`Page`] the way the injected script walks
//! `document`: every node kind is visible, including whitespace text and
//! comments.
//!
//! # Example
//!
//! ```
//! use dom_size_analyzer::page::Page;
//!
//! let page = Page::parse("<html><body><div id=\"app\"><p>hi</p></div></body></html>");
//! let body = page.body().expect("body");
//!
//! assert_eq!(body.descendant_element_count(), 2);
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Live DOM nodes.
pub mod node;

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use scraper::{Html, Node};
use tracing::trace;

// ============================================================================
// Re-exports
// ============================================================================

pub use node::{NodeData, PageNode};

// ============================================================================
// Constants
// ============================================================================

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

// ============================================================================
// Page
// ============================================================================

/// A loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    document: PageNode,
}

impl Page {
    /// Wraps an existing document node.
    #[inline]
    #[must_use]
    pub fn new(document: PageNode) -> Self {
        Self { document }
    }

    /// Builds `#document > html > (head, body)` around the given body.
    #[must_use]
    pub fn from_body(body: PageNode) -> Self {
        let html = PageNode::element("html")
            .with_child(PageNode::element("head"))
            .with_child(body);

        Self::new(PageNode::document().with_child(html))
    }

    /// Parses an HTML document.
    ///
    /// Parsing follows the HTML5 tree-construction rules, so missing
    /// `html`, `head` and `body` elements are synthesized.
    #[must_use]
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);

        let mut slots: Vec<Option<PageNode>> = Vec::new();
        let mut parents: Vec<Option<usize>> = Vec::new();
        let mut positions = FxHashMap::default();

        // Pre-order: a parent is always recorded before its children.
        for node in parsed.tree.root().descendants() {
            // Template contents live outside the tree, as in the DOM.
            if node.value().is_fragment() {
                continue;
            }
            let parent = match node.parent() {
                Some(parent) => match positions.get(&parent.id()) {
                    Some(&position) => Some(position),
                    None => continue,
                },
                None => None,
            };

            let position = slots.len();
            positions.insert(node.id(), position);
            parents.push(parent);
            slots.push(Some(convert(node.value())));
        }

        // Attach bottom-up; siblings arrive last-first and are reversed
        // once their subtree is complete.
        for position in (1..slots.len()).rev() {
            let Some(mut node) = slots[position].take() else {
                continue;
            };
            node.children_mut().reverse();

            if let Some(parent) = parents[position]
                && let Some(Some(parent_node)) = slots.get_mut(parent)
            {
                parent_node.push_child(node);
            }
        }

        let mut document = slots
            .into_iter()
            .next()
            .flatten()
            .unwrap_or_else(PageNode::document);
        document.children_mut().reverse();

        trace!(
            elements = document.descendant_element_count(),
            "Parsed HTML document"
        );

        Self::new(document)
    }
}

// ============================================================================
// Page - Accessors
// ============================================================================

impl Page {
    /// Returns the document node.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &PageNode {
        &self.document
    }

    /// Returns the root element (`document.documentElement`).
    #[must_use]
    pub fn document_element(&self) -> Option<&PageNode> {
        self.document.children().iter().find(|n| n.is_element())
    }

    /// Returns `document.body`: the first `body` or `frameset` child of the
    /// root element.
    #[must_use]
    pub fn body(&self) -> Option<&PageNode> {
        self.document_element()?
            .children()
            .iter()
            .find(|n| matches!(n.tag(), Some("body" | "frameset")))
    }

    /// Mutable access to the body.
    pub fn body_mut(&mut self) -> Option<&mut PageNode> {
        self.document
            .children_mut()
            .iter_mut()
            .find(|n| n.is_element())?
            .children_mut()
            .iter_mut()
            .find(|n| matches!(n.tag(), Some("body" | "frameset")))
    }

    /// Returns the node a collection starts from: the body, else the root
    /// element, else the document itself.
    #[must_use]
    pub fn collection_root(&self) -> &PageNode {
        self.body()
            .or_else(|| self.document_element())
            .unwrap_or(&self.document)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::from_body(PageNode::element("body"))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Converts one scraper node, without children.
fn convert(node: &Node) -> PageNode {
    match node {
        Node::Document | Node::Fragment => PageNode::document(),
        Node::Doctype(doctype) => PageNode::doctype(doctype.name()),
        Node::Comment(comment) => PageNode::comment(&**comment),
        Node::Text(text) => PageNode::text(&**text),
        Node::Element(element) => {
            let mut converted = if &*element.name.ns == HTML_NAMESPACE {
                PageNode::element(element.name())
            } else {
                PageNode::foreign_element(element.name())
            };
            for (name, value) in element.attrs() {
                converted.set_attr(name, value);
            }
            converted
        }
        Node::ProcessingInstruction(instruction) => {
            PageNode::processing_instruction(instruction.target.to_string(), &**instruction)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
