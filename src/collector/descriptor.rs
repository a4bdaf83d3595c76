//! Serializable node snapshots.
//!
//! [`NodeDescriptor`] is a closed variant type in memory and the flat DOM
//! record on the wire:
//!
//! ```json
//! {
//!   "nodeType": 1,
//!   "tagName": "DIV",
//!   "nodeName": "DIV",
//!   "nodeValue": null,
//!   "id": "app",
//!   "class": "main wide",
//!   "descendantsCount": 42,
//!   "attributesArr": [["id", "app"], ["class", "main wide"]],
//!   "uniqueIndex": 0,
//!   "depth": 0,
//!   "childNodes": [ ... ]
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::identifiers::NodeIndex;
use crate::page::node::{COMMENT_NODE, ELEMENT_NODE, TEXT_NODE};

// ============================================================================
// NodeKind
// ============================================================================

/// Kind-specific part of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element.
    Element(ElementInfo),
    /// A text node.
    Text {
        /// Character data.
        value: String,
    },
    /// A comment.
    Comment {
        /// Comment body.
        value: String,
    },
    /// Document, doctype, processing instruction or anything else.
    Other {
        /// Raw DOM `nodeType`.
        node_type: u16,
        /// Raw DOM `nodeName`.
        node_name: String,
        /// Raw DOM `nodeValue`.
        value: Option<String>,
    },
}

/// Element fields copied from the live node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    /// DOM `tagName` (upper-case for HTML elements).
    pub tag_name: String,
    /// `id` attribute.
    pub id: Option<String>,
    /// `class` attribute, verbatim.
    pub class: Option<String>,
    /// Attribute `(name, value)` pairs in order.
    pub attributes: Vec<(String, String)>,
}

// ============================================================================
// NodeDescriptor
// ============================================================================

/// Snapshot of one node plus its structural metadata.
///
/// The tree is owned: each descriptor exclusively owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireNode")]
pub struct NodeDescriptor {
    /// Pre-order position in the collection cycle.
    pub unique_index: NodeIndex,
    /// Distance from the collection root.
    pub depth: usize,
    /// Descendant element count; `0` for nodes without element queries.
    pub descendants_count: usize,
    /// Kind-specific fields.
    pub kind: NodeKind,
    /// Children in document order.
    pub child_nodes: Vec<NodeDescriptor>,
}

impl NodeDescriptor {
    /// Returns the DOM `nodeType`.
    #[must_use]
    pub fn node_type(&self) -> u16 {
        match &self.kind {
            NodeKind::Element(_) => ELEMENT_NODE,
            NodeKind::Text { .. } => TEXT_NODE,
            NodeKind::Comment { .. } => COMMENT_NODE,
            NodeKind::Other { node_type, .. } => *node_type,
        }
    }

    /// Returns the DOM `tagName`, present for elements only.
    #[inline]
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(info) => Some(&info.tag_name),
            _ => None,
        }
    }

    /// Returns the DOM `nodeName`.
    #[must_use]
    pub fn node_name(&self) -> &str {
        match &self.kind {
            NodeKind::Element(info) => &info.tag_name,
            NodeKind::Text { .. } => "#text",
            NodeKind::Comment { .. } => "#comment",
            NodeKind::Other { node_name, .. } => node_name,
        }
    }

    /// Returns the DOM `nodeValue`.
    #[must_use]
    pub fn node_value(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(_) => None,
            NodeKind::Text { value } | NodeKind::Comment { value } => Some(value),
            NodeKind::Other { value, .. } => value.as_deref(),
        }
    }

    /// Returns the `id` attribute.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(info) => info.id.as_deref(),
            _ => None,
        }
    }

    /// Returns the `class` attribute.
    #[inline]
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(info) => info.class.as_deref(),
            _ => None,
        }
    }

    /// Returns the attribute pairs, empty for non-elements.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        match &self.kind {
            NodeKind::Element(info) => &info.attributes,
            _ => &[],
        }
    }

    /// Returns `true` if the node carries an attribute named `name`.
    #[inline]
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes().iter().any(|(k, _)| k == name)
    }

    /// Short label `tag#id.class1.class2`.
    ///
    /// Falls back to `nodeName` when there is no tag; id and class parts are
    /// omitted when empty. Classes are split on single spaces.
    #[must_use]
    pub fn description(&self) -> String {
        let mut out = self.tag_name().unwrap_or(self.node_name()).to_string();

        if let Some(id) = self.id().filter(|id| !id.is_empty()) {
            out.push('#');
            out.push_str(id);
        }
        if let Some(class) = self.class().filter(|c| !c.is_empty()) {
            for part in class.split(' ') {
                out.push('.');
                out.push_str(part);
            }
        }

        out
    }

    /// Returns the subtree in pre-order, starting with `self`.
    #[must_use]
    pub fn flatten(&self) -> Vec<&NodeDescriptor> {
        let mut out = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.child_nodes.iter().rev());
        }

        out
    }

    /// Finds a node of this subtree by index.
    #[must_use]
    pub fn find(&self, index: NodeIndex) -> Option<&NodeDescriptor> {
        if self.unique_index == index {
            return Some(self);
        }
        self.child_nodes.iter().find_map(|child| child.find(index))
    }
}

// ============================================================================
// Wire Format
// ============================================================================

/// Borrowed flat record used for serialization.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireNodeRef<'a> {
    node_type: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag_name: Option<&'a str>,
    node_name: &'a str,
    node_value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<&'a str>,
    descendants_count: usize,
    attributes_arr: &'a [(String, String)],
    unique_index: NodeIndex,
    depth: usize,
    child_nodes: &'a [NodeDescriptor],
}

impl Serialize for NodeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireNodeRef {
            node_type: self.node_type(),
            tag_name: self.tag_name(),
            node_name: self.node_name(),
            node_value: self.node_value(),
            id: self.id(),
            class: self.class(),
            descendants_count: self.descendants_count,
            attributes_arr: self.attributes(),
            unique_index: self.unique_index,
            depth: self.depth,
            child_nodes: &self.child_nodes,
        }
        .serialize(serializer)
    }
}

/// Owned flat record used for deserialization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNode {
    node_type: u16,
    #[serde(default)]
    tag_name: Option<String>,
    #[serde(default)]
    node_name: String,
    #[serde(default)]
    node_value: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    descendants_count: usize,
    #[serde(default)]
    attributes_arr: Vec<(String, String)>,
    unique_index: NodeIndex,
    depth: usize,
    #[serde(default)]
    child_nodes: Vec<NodeDescriptor>,
}

impl TryFrom<WireNode> for NodeDescriptor {
    type Error = String;

    fn try_from(wire: WireNode) -> Result<Self, Self::Error> {
        let kind = match wire.node_type {
            ELEMENT_NODE => {
                let tag_name = wire
                    .tag_name
                    .or_else(|| (!wire.node_name.is_empty()).then_some(wire.node_name))
                    .ok_or_else(|| {
                        format!("element {} has no tagName", wire.unique_index)
                    })?;
                NodeKind::Element(ElementInfo {
                    tag_name,
                    id: wire.id,
                    class: wire.class,
                    attributes: wire.attributes_arr,
                })
            }
            TEXT_NODE => NodeKind::Text {
                value: wire.node_value.unwrap_or_default(),
            },
            COMMENT_NODE => NodeKind::Comment {
                value: wire.node_value.unwrap_or_default(),
            },
            node_type => NodeKind::Other {
                node_type,
                node_name: wire.node_name,
                value: wire.node_value,
            },
        };

        Ok(Self {
            unique_index: wire.unique_index,
            depth: wire.depth,
            descendants_count: wire.descendants_count,
            kind,
            child_nodes: wire.child_nodes,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn element(index: usize, tag: &str, id: Option<&str>, class: Option<&str>) -> NodeDescriptor {
        let mut attributes = Vec::new();
        if let Some(id) = id {
            attributes.push(("id".to_string(), id.to_string()));
        }
        if let Some(class) = class {
            attributes.push(("class".to_string(), class.to_string()));
        }
        NodeDescriptor {
            unique_index: NodeIndex::new(index),
            depth: 0,
            descendants_count: 0,
            kind: NodeKind::Element(ElementInfo {
                tag_name: tag.to_string(),
                id: id.map(String::from),
                class: class.map(String::from),
                attributes,
            }),
            child_nodes: Vec::new(),
        }
    }

    #[test]
    fn test_description() {
        assert_eq!(element(0, "DIV", None, None).description(), "DIV");
        assert_eq!(element(0, "DIV", Some("app"), None).description(), "DIV#app");
        assert_eq!(
            element(0, "UL", Some("nav"), Some("menu top")).description(),
            "UL#nav.menu.top"
        );
        assert_eq!(element(0, "P", Some(""), Some("")).description(), "P");
    }

    #[test]
    fn test_description_non_element() {
        let text = NodeDescriptor {
            unique_index: NodeIndex::new(1),
            depth: 1,
            descendants_count: 0,
            kind: NodeKind::Text {
                value: "hi".into(),
            },
            child_nodes: Vec::new(),
        };
        assert_eq!(text.description(), "#text");
        assert_eq!(text.node_value(), Some("hi"));
        assert!(text.tag_name().is_none());
    }

    #[test]
    fn test_serialize_flat_record() {
        let node = element(3, "SPAN", Some("x"), None);
        let value = serde_json::to_value(&node).expect("serialize");

        assert_eq!(
            value,
            json!({
                "nodeType": 1,
                "tagName": "SPAN",
                "nodeName": "SPAN",
                "nodeValue": null,
                "id": "x",
                "descendantsCount": 0,
                "attributesArr": [["id", "x"]],
                "uniqueIndex": 3,
                "depth": 0,
                "childNodes": []
            })
        );
    }

    #[test]
    fn test_deserialize_variants() {
        let value = json!({
            "nodeType": 1,
            "tagName": "BODY",
            "nodeName": "BODY",
            "descendantsCount": 1,
            "attributesArr": [],
            "uniqueIndex": 0,
            "depth": 0,
            "childNodes": [
                { "nodeType": 3, "nodeName": "#text", "nodeValue": "a", "uniqueIndex": 1, "depth": 1 },
                { "nodeType": 8, "nodeName": "#comment", "nodeValue": "b", "uniqueIndex": 2, "depth": 1 },
                { "nodeType": 10, "nodeName": "html", "uniqueIndex": 3, "depth": 1 }
            ]
        });

        let node: NodeDescriptor = serde_json::from_value(value).expect("parse");
        assert_eq!(node.tag_name(), Some("BODY"));
        assert!(matches!(node.child_nodes[0].kind, NodeKind::Text { .. }));
        assert!(matches!(node.child_nodes[1].kind, NodeKind::Comment { .. }));
        assert!(matches!(
            node.child_nodes[2].kind,
            NodeKind::Other { node_type: 10, .. }
        ));
    }

    #[test]
    fn test_deserialize_element_without_tag_fails() {
        let value = json!({ "nodeType": 1, "uniqueIndex": 0, "depth": 0 });
        assert!(serde_json::from_value::<NodeDescriptor>(value).is_err());
    }

    #[test]
    fn test_flatten_and_find() {
        let mut root = element(0, "BODY", None, None);
        let mut section = element(1, "SECTION", None, None);
        section.child_nodes.push(element(2, "P", None, None));
        root.child_nodes.push(section);
        root.child_nodes.push(element(3, "FOOTER", None, None));

        let order: Vec<_> = root.flatten().iter().map(|n| n.unique_index.get()).collect();
        assert_eq!(order, [0, 1, 2, 3]);
        assert_eq!(
            root.find(NodeIndex::new(2)).and_then(|n| n.tag_name()),
            Some("P")
        );
        assert!(root.find(NodeIndex::new(9)).is_none());
    }
}
