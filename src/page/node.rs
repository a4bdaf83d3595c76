//! Live DOM nodes.

use std::fmt;

// ============================================================================
// Constants
// ============================================================================

/// DOM `Node.ELEMENT_NODE`.
pub const ELEMENT_NODE: u16 = 1;
/// DOM `Node.TEXT_NODE`.
pub const TEXT_NODE: u16 = 3;
/// DOM `Node.PROCESSING_INSTRUCTION_NODE`.
pub const PROCESSING_INSTRUCTION_NODE: u16 = 7;
/// DOM `Node.COMMENT_NODE`.
pub const COMMENT_NODE: u16 = 8;
/// DOM `Node.DOCUMENT_NODE`.
pub const DOCUMENT_NODE: u16 = 9;
/// DOM `Node.DOCUMENT_TYPE_NODE`.
pub const DOCUMENT_TYPE_NODE: u16 = 10;

// ============================================================================
// NodeData
// ============================================================================

/// Kind-specific payload of a [`PageNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The document itself.
    Document,
    /// `<!DOCTYPE name>`.
    Doctype {
        /// Doctype name, usually `html`.
        name: String,
    },
    /// An element with its attributes in source order.
    Element {
        /// Local name; lower-case for HTML elements.
        name: String,
        /// `true` for the HTML namespace, `false` for SVG and MathML.
        html: bool,
        /// Attribute `(name, value)` pairs.
        attributes: Vec<(String, String)>,
    },
    /// Character data.
    Text(String),
    /// `<!-- ... -->`.
    Comment(String),
    /// `<?target data?>`.
    ProcessingInstruction {
        /// Instruction target.
        target: String,
        /// Instruction body.
        data: String,
    },
}

// ============================================================================
// PageNode
// ============================================================================

/// One node of the inspected page.
///
/// Built either by [`Page::parse`](super::Page::parse) or with the
/// constructors below:
///
/// ```
/// use dom_size_analyzer::page::PageNode;
///
/// let list = PageNode::element("ul")
///     .with_attr("id", "menu")
///     .with_child(PageNode::element("li").with_child(PageNode::text("Home")))
///     .with_child(PageNode::element("li").with_child(PageNode::text("About")));
///
/// assert_eq!(list.descendant_element_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    data: NodeData,
    children: Vec<PageNode>,
}

impl PageNode {
    /// Creates a node from raw data with no children.
    #[inline]
    #[must_use]
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    /// Creates an empty document node.
    #[inline]
    #[must_use]
    pub fn document() -> Self {
        Self::new(NodeData::Document)
    }

    /// Creates a doctype node.
    #[inline]
    #[must_use]
    pub fn doctype(name: impl Into<String>) -> Self {
        Self::new(NodeData::Doctype { name: name.into() })
    }

    /// Creates an HTML element without attributes.
    ///
    /// The name is stored lower-cased.
    #[inline]
    #[must_use]
    pub fn element(name: impl AsRef<str>) -> Self {
        Self::new(NodeData::Element {
            name: name.as_ref().to_ascii_lowercase(),
            html: true,
            attributes: Vec::new(),
        })
    }

    /// Creates an SVG or MathML element. The name keeps its case.
    #[inline]
    #[must_use]
    pub fn foreign_element(name: impl Into<String>) -> Self {
        Self::new(NodeData::Element {
            name: name.into(),
            html: false,
            attributes: Vec::new(),
        })
    }

    /// Creates a text node.
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeData::Text(value.into()))
    }

    /// Creates a comment node.
    #[inline]
    #[must_use]
    pub fn comment(value: impl Into<String>) -> Self {
        Self::new(NodeData::Comment(value.into()))
    }

    /// Creates a processing instruction node.
    #[inline]
    #[must_use]
    pub fn processing_instruction(target: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(NodeData::ProcessingInstruction {
            target: target.into(),
            data: data.into(),
        })
    }
}

// ============================================================================
// PageNode - Builder Methods
// ============================================================================

impl PageNode {
    /// Sets an attribute, replacing an existing value of the same name.
    ///
    /// Ignored on non-element nodes.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Appends a child.
    #[inline]
    #[must_use]
    pub fn with_child(mut self, child: PageNode) -> Self {
        self.children.push(child);
        self
    }

    /// Appends several children.
    #[inline]
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = PageNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Sets an attribute in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if let NodeData::Element { attributes, .. } = &mut self.data {
            let name = name.into();
            let value = value.into();
            match attributes.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => attributes.push((name, value)),
            }
        }
    }

    /// Appends a child in place.
    #[inline]
    pub fn push_child(&mut self, child: PageNode) {
        self.children.push(child);
    }

    /// Removes and returns the child at `index`, if any.
    pub fn remove_child(&mut self, index: usize) -> Option<PageNode> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Mutable access to the children.
    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<PageNode> {
        &mut self.children
    }
}

// ============================================================================
// PageNode - Accessors
// ============================================================================

impl PageNode {
    /// Returns the node payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Returns the children in document order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[PageNode] {
        &self.children
    }

    /// Returns the DOM `nodeType` constant.
    #[must_use]
    pub fn node_type(&self) -> u16 {
        match self.data {
            NodeData::Document => DOCUMENT_NODE,
            NodeData::Doctype { .. } => DOCUMENT_TYPE_NODE,
            NodeData::Element { .. } => ELEMENT_NODE,
            NodeData::Text(_) => TEXT_NODE,
            NodeData::Comment(_) => COMMENT_NODE,
            NodeData::ProcessingInstruction { .. } => PROCESSING_INSTRUCTION_NODE,
        }
    }

    /// Returns the DOM `nodeName`.
    ///
    /// HTML elements report their upper-cased tag name; foreign elements
    /// report their local name unchanged.
    #[must_use]
    pub fn node_name(&self) -> String {
        match &self.data {
            NodeData::Document => "#document".to_string(),
            NodeData::Doctype { name } => name.clone(),
            NodeData::Element { name, html: true, .. } => name.to_ascii_uppercase(),
            NodeData::Element { name, .. } => name.clone(),
            NodeData::Text(_) => "#text".to_string(),
            NodeData::Comment(_) => "#comment".to_string(),
            NodeData::ProcessingInstruction { target, .. } => target.clone(),
        }
    }

    /// Returns the DOM `nodeValue` (character data nodes only).
    #[must_use]
    pub fn node_value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(value) | NodeData::Comment(value) => Some(value),
            NodeData::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns the local name for elements.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns `true` for element nodes.
    #[inline]
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    /// Returns `true` if the node can be queried for descendant elements
    /// (elements and documents).
    #[inline]
    #[must_use]
    pub fn supports_element_query(&self) -> bool {
        matches!(self.data, NodeData::Element { .. } | NodeData::Document)
    }

    /// Returns the attributes, empty for non-elements.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        match &self.data {
            NodeData::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Returns an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Counts every element below this node, at any depth.
    #[must_use]
    pub fn descendant_element_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| usize::from(child.is_element()) + child.descendant_element_count())
            .sum()
    }
}

impl fmt::Display for PageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            NodeData::Element { name, .. } => write!(f, "<{name}>"),
            _ => f.write_str(&self.node_name()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_names() {
        let div = PageNode::element("DIV");
        assert_eq!(div.tag(), Some("div"));
        assert_eq!(div.node_name(), "DIV");
        assert_eq!(div.node_type(), ELEMENT_NODE);
    }

    #[test]
    fn test_foreign_element_keeps_case() {
        let object = PageNode::foreign_element("foreignObject");
        assert_eq!(object.tag(), Some("foreignObject"));
        assert_eq!(object.node_name(), "foreignObject");
        assert!(object.is_element());
    }

    #[test]
    fn test_character_data_nodes() {
        let text = PageNode::text("hello");
        let comment = PageNode::comment("note");

        assert_eq!(text.node_name(), "#text");
        assert_eq!(text.node_value(), Some("hello"));
        assert_eq!(comment.node_type(), COMMENT_NODE);
        assert_eq!(comment.node_value(), Some("note"));
        assert!(!text.supports_element_query());
    }

    #[test]
    fn test_set_attr_replaces() {
        let node = PageNode::element("p")
            .with_attr("class", "a")
            .with_attr("id", "x")
            .with_attr("class", "b");

        assert_eq!(node.attributes().len(), 2);
        assert_eq!(node.attr("class"), Some("b"));
        assert_eq!(node.attributes()[0].0, "class");
    }

    #[test]
    fn test_attr_ignored_on_text() {
        let text = PageNode::text("x").with_attr("id", "nope");
        assert!(text.attributes().is_empty());
    }

    #[test]
    fn test_descendant_element_count_skips_text() {
        let tree = PageNode::element("div")
            .with_child(PageNode::text(" "))
            .with_child(
                PageNode::element("section")
                    .with_child(PageNode::element("p").with_child(PageNode::text("hi")))
                    .with_child(PageNode::comment("c")),
            );

        assert_eq!(tree.descendant_element_count(), 2);
    }

    #[test]
    fn test_remove_child() {
        let mut list = PageNode::element("ul")
            .with_child(PageNode::element("li"))
            .with_child(PageNode::element("li"));

        assert!(list.remove_child(0).is_some());
        assert!(list.remove_child(5).is_none());
        assert_eq!(list.children().len(), 1);
    }
}
