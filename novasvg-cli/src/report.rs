//! Results of `info` and `query`, printable as text or JSON.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use novasvg::{BoundingBox, Document, Element, NovaResult};
use serde::Serialize;

/// Summary of a loaded document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// Source file.
    pub file: String,
    /// Intrinsic width.
    pub width: f32,
    /// Intrinsic height.
    pub height: f32,
    /// Bounds of the drawn content.
    pub bounding_box: BoundingBox,
    /// Total element count, root included.
    pub element_count: usize,
    /// Element count per tag name.
    pub elements_by_tag: BTreeMap<String, usize>,
    /// Number of text nodes.
    pub text_nodes: usize,
}

impl DocumentInfo {
    /// Collect the summary for `document`, loaded from `file`.
    ///
    /// # Errors
    ///
    /// Returns the engine's layout error.
    pub fn collect(file: &Path, document: &Document) -> NovaResult<Self> {
        let (width, height) = document.size()?;
        let bounding_box = document.bounding_box()?;

        let mut elements_by_tag = BTreeMap::new();
        let mut element_count = 0;
        let mut text_nodes = 0;
        for element in document.elements() {
            element_count += 1;
            *elements_by_tag
                .entry(element.tag_name().to_string())
                .or_insert(0) += 1;
            text_nodes += element.children().filter(|n| n.is_text_node()).count();
        }

        Ok(Self {
            file: file.display().to_string(),
            width,
            height,
            bounding_box,
            element_count,
            elements_by_tag,
            text_nodes,
        })
    }
}

impl fmt::Display for DocumentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.file)?;
        writeln!(f, "Size: {}x{}", self.width, self.height)?;
        writeln!(f, "Bounding Box: {}", BoxText(&self.bounding_box))?;
        writeln!(f, "Elements: {}", self.element_count)?;
        for (tag, count) in &self.elements_by_tag {
            writeln!(f, "  {tag}: {count}")?;
        }
        write!(f, "Text nodes: {}", self.text_nodes)
    }
}

/// One element matched by a selector.
#[derive(Debug, Clone, Serialize)]
pub struct MatchInfo {
    /// Position in document order among the matches, starting at 1.
    pub index: usize,
    /// Tag name.
    pub tag: String,
    /// Bounds in the parent's coordinate space.
    pub bounding_box: BoundingBox,
    /// Bounds in the element's own space.
    pub local_bounding_box: BoundingBox,
    /// Bounds in canvas space.
    pub global_bounding_box: BoundingBox,
    /// `id` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `class` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// `fill` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// `stroke` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
}

impl MatchInfo {
    /// Describe `element` as the `index`th match.
    ///
    /// # Errors
    ///
    /// Returns the engine's layout error.
    pub fn collect(index: usize, element: &Element<'_>) -> NovaResult<Self> {
        let attribute = |name: &str| element.attribute(name).map(str::to_string);
        Ok(Self {
            index,
            tag: element.tag_name().to_string(),
            bounding_box: element.bounding_box()?,
            local_bounding_box: element.local_bounding_box()?,
            global_bounding_box: element.global_bounding_box()?,
            id: attribute("id"),
            class: attribute("class"),
            fill: attribute("fill"),
            stroke: attribute("stroke"),
        })
    }
}

impl fmt::Display for MatchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Element {}: <{}>", self.index, self.tag)?;
        writeln!(f, "  Bounding Box: {}", BoxText(&self.bounding_box))?;
        writeln!(f, "  Local BBox: {}", BoxText(&self.local_bounding_box))?;
        write!(f, "  Global BBox: {}", BoxText(&self.global_bounding_box))?;
        for (label, value) in [
            ("ID", &self.id),
            ("Class", &self.class),
            ("Fill", &self.fill),
            ("Stroke", &self.stroke),
        ] {
            if let Some(value) = value {
                write!(f, "\n  {label}: {value}")?;
            }
        }
        Ok(())
    }
}

struct BoxText<'a>(&'a BoundingBox);

impl fmt::Display for BoxText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(f, "x={}, y={}, w={}, h={}", b.x, b.y, b.w, b.h)
    }
}
