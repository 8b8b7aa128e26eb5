//! Loaded SVG documents.
//!
//! A [`Document`] owns a mutable node tree and lazily builds a usvg render
//! tree from it. Any mutation drops the cached layout; the next query that
//! needs geometry or pixels rebuilds it.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use crate::bitmap::Bitmap;
use crate::error::{NovaError, NovaResult};
use crate::fonts;
use crate::geometry::{BoundingBox, Matrix};
use crate::node::{Element, Node};
use crate::selector::Selector;
use crate::tree::{Attribute, NodeId, NodeKind, NodeTree};
use crate::writer::{self, WriteOptions};

/// A render tree built from the current state of a document.
pub(crate) struct Layout {
    pub(crate) tree: usvg::Tree,
    /// Declared size, or zero when the root declares none.
    pub(crate) intrinsic: (f32, f32),
}

impl Layout {
    /// Look up the render node built for a document element.
    pub(crate) fn node(&self, key: &str) -> Option<&usvg::Node> {
        self.tree.node_by_id(key)
    }
}

/// A parsed SVG document.
pub struct Document {
    pub(crate) tree: NodeTree,
    style_sheets: Vec<String>,
    resources_dir: Option<PathBuf>,
    layout: RefCell<Option<Rc<Layout>>>,
}

impl Document {
    /// Load a document from a file.
    ///
    /// Relative references (images, for example) resolve against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::FileRead`] if the file cannot be read, or any
    /// error of [`Document::load_from_bytes`].
    pub fn load_from_file(path: impl AsRef<Path>) -> NovaResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| NovaError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let text = std::str::from_utf8(&data)?;
        let resources_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(Path::to_path_buf);
        tracing::debug!(path = %path.display(), bytes = data.len(), "loading SVG file");
        Self::build(text, resources_dir)
    }

    /// Load a document from SVG markup.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Parse`] for malformed XML, [`NovaError::NotSvg`]
    /// when the root is not `svg` and [`NovaError::Layout`] when the
    /// document cannot be laid out.
    pub fn load_from_data(data: &str) -> NovaResult<Self> {
        Self::build(data, None)
    }

    /// Load a document from UTF-8 encoded SVG markup.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Utf8`] for invalid UTF-8, otherwise as
    /// [`Document::load_from_data`].
    pub fn load_from_bytes(data: &[u8]) -> NovaResult<Self> {
        Self::load_from_data(std::str::from_utf8(data)?)
    }

    fn build(text: &str, resources_dir: Option<PathBuf>) -> NovaResult<Self> {
        let document = Self {
            tree: NodeTree::parse(text)?,
            style_sheets: Vec::new(),
            resources_dir,
            layout: RefCell::new(None),
        };
        document.update_layout()?;
        Ok(document)
    }

    /// Intrinsic width. Zero when the root declares no size or `viewBox`.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn width(&self) -> NovaResult<f32> {
        Ok(self.layout()?.intrinsic.0)
    }

    /// Intrinsic height. Zero when the root declares no size or `viewBox`.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn height(&self) -> NovaResult<f32> {
        Ok(self.layout()?.intrinsic.1)
    }

    /// Intrinsic `(width, height)`.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn size(&self) -> NovaResult<(f32, f32)> {
        Ok(self.layout()?.intrinsic)
    }

    /// Bounds of the rendered content in document space.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn bounding_box(&self) -> NovaResult<BoundingBox> {
        Ok(self.layout()?.tree.root().abs_bounding_box().into())
    }

    /// Build the render tree if a mutation invalidated it.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn update_layout(&self) -> NovaResult<()> {
        self.layout().map(|_| ())
    }

    /// Rebuild the render tree unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn force_layout(&self) -> NovaResult<()> {
        self.invalidate();
        self.update_layout()
    }

    pub(crate) fn layout(&self) -> NovaResult<Rc<Layout>> {
        if let Some(layout) = self.layout.borrow().as_ref() {
            return Ok(Rc::clone(layout));
        }

        let layout = Rc::new(self.build_layout()?);
        *self.layout.borrow_mut() = Some(Rc::clone(&layout));
        Ok(layout)
    }

    fn build_layout(&self) -> NovaResult<Layout> {
        let markup = writer::write_svg(
            &self.tree,
            &WriteOptions {
                style_sheets: &self.style_sheets,
                layout_ids: true,
            },
        )?;

        let options = usvg::Options {
            resources_dir: self.resources_dir.clone(),
            fontdb: fonts::database(),
            ..usvg::Options::default()
        };
        let tree =
            usvg::Tree::from_str(&markup, &options).map_err(|e| NovaError::Layout(e.to_string()))?;

        let root = &self.tree[self.tree.root()];
        let declares_size = ["width", "height", "viewBox"]
            .iter()
            .any(|name| root.attribute(name).is_some());
        let intrinsic = if declares_size {
            (tree.size().width(), tree.size().height())
        } else {
            (0.0, 0.0)
        };

        tracing::debug!(
            width = intrinsic.0,
            height = intrinsic.1,
            nodes = self.tree.len(),
            "laid out document"
        );
        Ok(Layout { tree, intrinsic })
    }

    fn invalidate(&self) {
        self.layout.borrow_mut().take();
    }

    /// The root `svg` element.
    #[must_use]
    pub fn document_element(&self) -> Element<'_> {
        Element::new(self, self.tree.root())
    }

    /// Handle for any node of this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        self.tree.get(id).map(|_| Node::new(self, id))
    }

    /// First element whose `id` attribute equals `id`, in document order.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<Element<'_>> {
        if id.is_empty() {
            return None;
        }
        self.tree
            .descendants(self.tree.root())
            .find(|&node| self.tree[node].attribute("id") == Some(id))
            .map(|node| Element::new(self, node))
    }

    /// Every element matching `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidSelector`] if the selector cannot be parsed.
    pub fn query_selector_all(&self, selector: &str) -> NovaResult<Vec<Element<'_>>> {
        let selector = Selector::parse(selector)?;
        Ok(self.elements().filter(|e| selector.matches(e)).collect())
    }

    /// First element matching `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidSelector`] if the selector cannot be parsed.
    pub fn query_selector(&self, selector: &str) -> NovaResult<Option<Element<'_>>> {
        let selector = Selector::parse(selector)?;
        Ok(self.elements().find(|e| selector.matches(e)))
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> + '_ {
        self.tree
            .descendants(self.tree.root())
            .filter(|&id| self.tree[id].is_element())
            .map(|id| Element::new(self, id))
    }

    /// Append a user stylesheet, applied from the next layout on.
    ///
    /// Rules the CSS engine does not understand are ignored.
    pub fn apply_style_sheet(&mut self, css: &str) {
        if css.trim().is_empty() {
            return;
        }
        self.style_sheets.push(css.to_string());
        self.invalidate();
        tracing::debug!(sheets = self.style_sheets.len(), "applied style sheet");
    }

    /// Topmost rendered shape whose document-space bounds contain the point.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn element_from_point(&self, x: f32, y: f32) -> NovaResult<Option<Element<'_>>> {
        let layout = self.layout()?;
        let hit = self
            .elements()
            .filter(|element| {
                element
                    .render_node(&layout)
                    .filter(|node| !matches!(node, usvg::Node::Group(_)))
                    .is_some_and(|node| BoundingBox::from(node.abs_bounding_box()).contains(x, y))
            })
            .last();
        Ok(hit)
    }

    /// Draw the document onto `bitmap`, mapping document space through `matrix`.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Layout`] if the document cannot be laid out.
    pub fn render(&self, bitmap: &mut Bitmap, matrix: Matrix) -> NovaResult<()> {
        let layout = self.layout()?;
        resvg::render(&layout.tree, matrix.into(), &mut bitmap.pixmap_mut().as_mut());
        Ok(())
    }

    /// Render into a new bitmap.
    ///
    /// A `width` or `height` of zero or less is derived from the intrinsic
    /// size, keeping the aspect ratio when the other dimension is given.
    /// The bitmap is filled with `background` (`0xRRGGBBAA`) first.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidSize`] when the document has no intrinsic
    /// size, and [`NovaError::Layout`] if it cannot be laid out.
    pub fn render_to_bitmap(&self, width: i32, height: i32, background: u32) -> NovaResult<Bitmap> {
        let (iw, ih) = self.size()?;
        let (w, h) = resolve_size(width, height, iw, ih)?;

        let mut bitmap = Bitmap::new(w, h)?;
        bitmap.clear(background);
        #[allow(clippy::cast_precision_loss)]
        let matrix = Matrix::scaled(w as f32 / iw, h as f32 / ih);
        self.render(&mut bitmap, matrix)?;

        tracing::debug!(width = w, height = h, "rendered document");
        Ok(bitmap)
    }

    /// Set (or add) an attribute on an element.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidNode`] if `id` is not an element of this document.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> NovaResult<()> {
        let attributes = self.attributes_mut(id)?;
        match attributes.iter_mut().find(|a| a.name == name) {
            Some(attribute) => value.clone_into(&mut attribute.value),
            None => attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
        self.invalidate();
        Ok(())
    }

    /// Remove an attribute from an element. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidNode`] if `id` is not an element of this document.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> NovaResult<bool> {
        let attributes = self.attributes_mut(id)?;
        let before = attributes.len();
        attributes.retain(|a| a.name != name);
        let removed = attributes.len() != before;
        if removed {
            self.invalidate();
        }
        Ok(removed)
    }

    /// Replace the character data of a text node.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidNode`] if `id` is not a text node of this document.
    pub fn set_text_data(&mut self, id: NodeId, data: &str) -> NovaResult<()> {
        match self.tree.get_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Text(text)) => data.clone_into(text),
            Some(NodeKind::Element { .. }) => {
                return Err(NovaError::InvalidNode(format!("{id} is not a text node")))
            }
            None => return Err(NovaError::InvalidNode(format!("{id} does not exist"))),
        }
        self.invalidate();
        Ok(())
    }

    fn attributes_mut(&mut self, id: NodeId) -> NovaResult<&mut Vec<Attribute>> {
        match self.tree.get_mut(id).map(|node| &mut node.kind) {
            Some(NodeKind::Element { attributes, .. }) => Ok(attributes),
            Some(NodeKind::Text(_)) => Err(NovaError::InvalidNode(format!("{id} is not an element"))),
            None => Err(NovaError::InvalidNode(format!("{id} does not exist"))),
        }
    }

    /// Serialize the current tree, including applied stylesheets.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Export`] if the markup cannot be written.
    pub fn to_svg_string(&self) -> NovaResult<String> {
        writer::write_svg(
            &self.tree,
            &WriteOptions {
                style_sheets: &self.style_sheets,
                layout_ids: false,
            },
        )
    }
}

impl FromStr for Document {
    type Err = NovaError;

    fn from_str(data: &str) -> NovaResult<Self> {
        Self::load_from_data(data)
    }
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            style_sheets: self.style_sheets.clone(),
            resources_dir: self.resources_dir.clone(),
            layout: RefCell::new(self.layout.borrow().clone()),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.len())
            .field("style_sheets", &self.style_sheets.len())
            .field("resources_dir", &self.resources_dir)
            .field("laid_out", &self.layout.borrow().is_some())
            .finish()
    }
}

/// Resolve a requested render size against an intrinsic size.
///
/// Values of zero or less are automatic. Explicit values are used as given;
/// only derived dimensions go through floating point.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn resolve_size(
    width: i32,
    height: i32,
    intrinsic_width: f32,
    intrinsic_height: f32,
) -> NovaResult<(u32, u32)> {
    if intrinsic_width <= 0.0 || intrinsic_height <= 0.0 {
        return Err(NovaError::InvalidSize(format!(
            "nothing to render: intrinsic size is {intrinsic_width}x{intrinsic_height}"
        )));
    }

    let explicit = |value: i32| u32::try_from(value).ok().filter(|&v| v > 0);
    match (explicit(width), explicit(height)) {
        (Some(w), Some(h)) => Ok((w, h)),
        (Some(w), None) => Ok((w, derived(w as f32 * intrinsic_height / intrinsic_width)?)),
        (None, Some(h)) => Ok((derived(h as f32 * intrinsic_width / intrinsic_height)?, h)),
        (None, None) => Ok((derived(intrinsic_width)?, derived(intrinsic_height)?)),
    }
}

/// Round a derived length up to whole pixels.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn derived(length: f32) -> NovaResult<u32> {
    let pixels = length.ceil();
    if !(pixels >= 1.0 && pixels <= u32::MAX as f32) {
        return Err(NovaError::InvalidSize(format!("cannot render at {length} pixels")));
    }
    Ok(pixels as u32)
}
