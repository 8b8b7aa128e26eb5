//! Mutable node storage for a parsed document.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. The
//! root `svg` element is always the first node.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{NovaError, NovaResult};

/// The SVG namespace URI.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
/// The XLink namespace URI.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Elements whose whitespace-only text children are significant.
const TEXT_CONTAINERS: &[&str] = &["text", "tspan", "textPath", "style", "title", "desc"];

/// Index of a node inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in document order of creation.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A name/value attribute pair. Namespaced attributes use their
/// conventional prefix (`xlink:href`, `xml:space`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Qualified attribute name.
    pub name: String,
    /// Attribute value as written.
    pub value: String,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) kind: NodeKind,
}

impl NodeData {
    pub(crate) fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    pub(crate) fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    pub(crate) fn attributes(&self) -> &[Attribute] {
        match &self.kind {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Text(_) => &[],
        }
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct NodeTree {
    nodes: Vec<NodeData>,
}

impl NodeTree {
    /// Parse SVG markup into a tree rooted at the `svg` element.
    pub(crate) fn parse(text: &str) -> NovaResult<Self> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let xml = roxmltree::Document::parse_with_options(text, options)
            .map_err(|e| NovaError::Parse(e.to_string()))?;

        let root = xml.root_element();
        if !in_svg_namespace(root) || root.tag_name().name() != "svg" {
            return Err(NovaError::NotSvg(root.tag_name().name().to_string()));
        }

        let mut tree = Self::default();
        tree.append_element(None, root);
        Ok(tree)
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            parent,
            children: Vec::new(),
            kind,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn append_element(&mut self, parent: Option<NodeId>, node: roxmltree::Node<'_, '_>) {
        let tag = node.tag_name().name();
        let attributes = node
            .attributes()
            .filter_map(|attr| {
                qualified_name(attr.namespace(), attr.name()).map(|name| Attribute {
                    name,
                    value: attr.value().to_string(),
                })
            })
            .collect();
        let keeps_whitespace = TEXT_CONTAINERS.contains(&tag);

        let id = self.push(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attributes,
            },
        );

        for child in node.children() {
            if child.is_element() {
                if in_svg_namespace(child) {
                    self.append_element(Some(id), child);
                }
            } else if child.is_text() {
                let text = child.text().unwrap_or_default();
                if keeps_whitespace || !text.trim().is_empty() {
                    self.push(Some(id), NodeKind::Text(text.to_string()));
                }
            }
        }
    }

    pub(crate) fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, text included.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id.0)
    }

    /// `id` and everything below it, in document order.
    pub(crate) fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }
}

impl Index<NodeId> for NodeTree {
    type Output = NodeData;

    fn index(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// Pre-order traversal over a subtree.
pub(crate) struct Descendants<'a> {
    tree: &'a NodeTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(node) = self.tree.get(id) {
            self.stack.extend(node.children.iter().rev().copied());
        }
        Some(id)
    }
}

fn in_svg_namespace(node: roxmltree::Node<'_, '_>) -> bool {
    matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

fn qualified_name(namespace: Option<&str>, name: &str) -> Option<String> {
    match namespace {
        None => Some(name.to_string()),
        Some(XLINK_NS) => Some(format!("xlink:{name}")),
        Some(XML_NS) => Some(format!("xml:{name}")),
        Some(_) => None,
    }
}
