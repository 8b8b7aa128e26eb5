//! Borrowed handles onto document nodes.

use std::fmt;
use std::ptr;

use crate::bitmap::Bitmap;
use crate::document::{self, Document, Layout};
use crate::error::NovaResult;
use crate::geometry::{BoundingBox, Matrix};
use crate::tree::{Attribute, NodeData, NodeId, NodeKind};
use crate::writer;

/// Any node of a document: an element or a run of character data.
#[derive(Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// An element node.
    Element(Element<'a>),
    /// A text node.
    Text(TextNode<'a>),
}

impl<'a> Node<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        if doc.tree[id].is_element() {
            Node::Element(Element { doc, id })
        } else {
            Node::Text(TextNode { doc, id })
        }
    }

    /// Id of the node within its document.
    #[must_use]
    pub fn id(&self) -> NodeId {
        match self {
            Node::Element(e) => e.id,
            Node::Text(t) => t.id,
        }
    }

    /// True for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    /// True for text nodes.
    #[must_use]
    pub fn is_text_node(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    /// The node as an element, if it is one.
    #[must_use]
    pub fn as_element(&self) -> Option<Element<'a>> {
        match *self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// The node as a text node, if it is one.
    #[must_use]
    pub fn as_text_node(&self) -> Option<TextNode<'a>> {
        match *self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    /// The element containing this node. `None` for the root.
    #[must_use]
    pub fn parent_element(&self) -> Option<Element<'a>> {
        match self {
            Node::Element(e) => e.parent_element(),
            Node::Text(t) => t.parent_element(),
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(e) => e.fmt(f),
            Node::Text(t) => t.fmt(f),
        }
    }
}

/// A character data node.
#[derive(Clone, Copy)]
pub struct TextNode<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> TextNode<'a> {
    /// Id of the node within its document.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The character data.
    #[must_use]
    pub fn data(&self) -> &'a str {
        match &self.doc.tree[self.id].kind {
            NodeKind::Text(text) => text,
            NodeKind::Element { .. } => "",
        }
    }

    /// The element containing this text.
    #[must_use]
    pub fn parent_element(&self) -> Option<Element<'a>> {
        parent_of(self.doc, self.id)
    }
}

impl PartialEq for TextNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl fmt::Debug for TextNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNode")
            .field("id", &self.id)
            .field("data", &self.data())
            .finish()
    }
}

/// An element of a document.
///
/// Geometry is expressed in three spaces: the element's own user space
/// (`local_*`), its parent's user space (`bounding_box`) and document space
/// (`global_*`). Elements that produce no rendering, such as those inside
/// `defs` or with `display="none"`, have empty boxes and share their
/// parent's space.
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    id: NodeId,
}

/// Where an element lives in the render tree.
enum RenderTarget<'l> {
    Root(&'l usvg::Group),
    Node(&'l usvg::Node),
    Missing,
}

impl<'a> Element<'a> {
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    fn data(&self) -> &'a NodeData {
        &self.doc.tree[self.id]
    }

    /// Id of the node within its document.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The document this element belongs to.
    #[must_use]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Local tag name, e.g. `rect`.
    #[must_use]
    pub fn tag_name(&self) -> &'a str {
        self.data().tag().unwrap_or_default()
    }

    /// All attributes in source order.
    #[must_use]
    pub fn attributes(&self) -> &'a [Attribute] {
        self.data().attributes()
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.data().attribute(name)
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Child nodes, text included.
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| Node::new(doc, id))
    }

    /// Child elements only.
    pub fn child_elements(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.children().filter_map(|node| node.as_element())
    }

    /// The containing element. `None` for the root.
    #[must_use]
    pub fn parent_element(&self) -> Option<Element<'a>> {
        parent_of(self.doc, self.id)
    }

    /// The element sibling just before this one.
    #[must_use]
    pub fn previous_element_sibling(&self) -> Option<Element<'a>> {
        let siblings = self.siblings()?;
        let position = siblings.iter().position(|&id| id == self.id)?;
        siblings[..position]
            .iter()
            .rev()
            .find(|&&id| self.doc.tree[id].is_element())
            .map(|&id| Element::new(self.doc, id))
    }

    /// The element sibling just after this one.
    #[must_use]
    pub fn next_element_sibling(&self) -> Option<Element<'a>> {
        let siblings = self.siblings()?;
        let position = siblings.iter().position(|&id| id == self.id)?;
        siblings[position + 1..]
            .iter()
            .find(|&&id| self.doc.tree[id].is_element())
            .map(|&id| Element::new(self.doc, id))
    }

    fn siblings(&self) -> Option<&'a [NodeId]> {
        let parent = self.data().parent?;
        Some(&self.doc.tree[parent].children)
    }

    /// Concatenated character data of every descendant text node.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.doc
            .tree
            .descendants(self.id)
            .filter_map(|id| match &self.doc.tree[id].kind {
                NodeKind::Text(text) => Some(text.as_str()),
                NodeKind::Element { .. } => None,
            })
            .collect()
    }

    pub(crate) fn render_node<'l>(&self, layout: &'l Layout) -> Option<&'l usvg::Node> {
        if self.id == self.doc.tree.root() {
            return None;
        }
        layout.node(&writer::layout_key(&self.doc.tree, self.id))
    }

    fn target<'l>(&self, layout: &'l Layout) -> RenderTarget<'l> {
        if self.id == self.doc.tree.root() {
            return RenderTarget::Root(layout.tree.root());
        }
        self.render_node(layout)
            .map_or(RenderTarget::Missing, RenderTarget::Node)
    }

    fn global_matrix_in(&self, layout: &Layout) -> Matrix {
        match self.target(layout) {
            RenderTarget::Root(group) => group.abs_transform().into(),
            RenderTarget::Node(node) => node.abs_transform().into(),
            RenderTarget::Missing => self
                .parent_element()
                .map_or_else(Matrix::identity, |parent| parent.global_matrix_in(layout)),
        }
    }

    fn local_matrix_in(&self, layout: &Layout) -> Matrix {
        let global = self.global_matrix_in(layout);
        let parent = self
            .parent_element()
            .map_or_else(Matrix::identity, |parent| parent.global_matrix_in(layout));
        parent
            .inverse()
            .map_or_else(Matrix::identity, |inverse| inverse.pre_concat(&global))
    }

    fn local_bounding_box_in(&self, layout: &Layout) -> BoundingBox {
        match self.target(layout) {
            RenderTarget::Root(group) => group.bounding_box().into(),
            RenderTarget::Node(node) => node.bounding_box().into(),
            RenderTarget::Missing => BoundingBox::default(),
        }
    }

    fn local_stroke_bounding_box_in(&self, layout: &Layout) -> BoundingBox {
        match self.target(layout) {
            RenderTarget::Root(group) => group.stroke_bounding_box().into(),
            RenderTarget::Node(node) => node.stroke_bounding_box().into(),
            RenderTarget::Missing => BoundingBox::default(),
        }
    }

    /// Transform from this element's user space to its parent's.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::Layout`] if the document cannot be laid out.
    pub fn local_matrix(&self) -> NovaResult<Matrix> {
        let layout = self.doc.layout()?;
        Ok(self.local_matrix_in(&layout))
    }

    /// Transform from this element's user space to document space.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::Layout`] if the document cannot be laid out.
    pub fn global_matrix(&self) -> NovaResult<Matrix> {
        let layout = self.doc.layout()?;
        Ok(self.global_matrix_in(&layout))
    }

    /// Fill bounds in the element's own user space.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::Layout`] if the document cannot be laid out.
    pub fn local_bounding_box(&self) -> NovaResult<BoundingBox> {
        let layout = self.doc.layout()?;
        Ok(self.local_bounding_box_in(&layout))
    }

    /// Fill bounds in the parent's user space.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::Layout`] if the document cannot be laid out.
    pub fn bounding_box(&self) -> NovaResult<BoundingBox> {
        let layout = self.doc.layout()?;
        let local = self.local_bounding_box_in(&layout);
        if local.is_empty() {
            return Ok(local);
        }
        Ok(local.transformed(&self.local_matrix_in(&layout)))
    }

    /// Fill bounds in document space.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::Layout`] if the document cannot be laid out.
    pub fn global_bounding_box(&self) -> NovaResult<BoundingBox> {
        let layout = self.doc.layout()?;
        Ok(match self.target(&layout) {
            RenderTarget::Root(group) => group.abs_bounding_box().into(),
            RenderTarget::Node(node) => node.abs_bounding_box().into(),
            RenderTarget::Missing => BoundingBox::default(),
        })
    }

    /// Draw this element alone onto `bitmap`, mapping the parent's user
    /// space through `matrix`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::Layout`] if the document cannot be laid out.
    pub fn render(&self, bitmap: &mut Bitmap, matrix: Matrix) -> NovaResult<()> {
        let layout = self.doc.layout()?;
        let node = match self.target(&layout) {
            RenderTarget::Root(_) => return self.doc.render(bitmap, matrix),
            RenderTarget::Missing => return Ok(()),
            RenderTarget::Node(node) => node,
        };

        let parent = self
            .parent_element()
            .map_or_else(Matrix::identity, |parent| parent.global_matrix_in(&layout));
        let Some(parent_inverse) = parent.inverse() else {
            return Ok(());
        };
        let Some(layer) = node.abs_layer_bounding_box() else {
            return Ok(());
        };

        // resvg draws a node in the space of its parent group, shifted so
        // its layer bounds start at the origin.
        let mut content = matrix.pre_concat(&parent_inverse.pre_concat(&node.abs_transform().into()));
        if let usvg::Node::Group(group) = node {
            if let Some(own_inverse) = Matrix::from(group.transform()).inverse() {
                content = content.pre_concat(&own_inverse);
            }
        }
        content.translate(layer.x(), layer.y());

        resvg::render_node(node, content.into(), &mut bitmap.pixmap_mut().as_mut());
        Ok(())
    }

    /// Render this element into a new bitmap framed on its painted bounds.
    ///
    /// Sizes follow the same automatic rules as
    /// [`Document::render_to_bitmap`], with the painted bounds standing in
    /// for the intrinsic size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::NovaError::InvalidSize`] when nothing is painted.
    pub fn render_to_bitmap(&self, width: i32, height: i32, background: u32) -> NovaResult<Bitmap> {
        let layout = self.doc.layout()?;
        let bounds = self
            .local_stroke_bounding_box_in(&layout)
            .transformed(&self.local_matrix_in(&layout));
        let (w, h) = document::resolve_size(width, height, bounds.w, bounds.h)?;

        let mut bitmap = Bitmap::new(w, h)?;
        bitmap.clear(background);

        #[allow(clippy::cast_precision_loss)]
        let (sx, sy) = (w as f32 / bounds.w, h as f32 / bounds.h);
        let matrix = Matrix::new(sx, 0.0, 0.0, sy, -bounds.x * sx, -bounds.y * sy);
        self.render(&mut bitmap, matrix)?;

        tracing::debug!(element = %self.id, tag = self.tag_name(), width = w, height = h, "rendered element");
        Ok(bitmap)
    }
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Element");
        debug.field("id", &self.id).field("tag", &self.tag_name());
        if let Some(id) = self.attribute("id") {
            debug.field("element_id", &id);
        }
        debug.finish()
    }
}

fn parent_of(doc: &Document, id: NodeId) -> Option<Element<'_>> {
    let parent = doc.tree[id].parent?;
    Some(Element::new(doc, parent))
}
