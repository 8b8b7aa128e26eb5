//! # NovaSVG
//!
//! Load, query and rasterize SVG, and move pixels in and out of the engine
//! as `height x width x 4` RGBA arrays.
//!
//! ```no_run
//! use novasvg::{render_svg, AUTO_SIZE, TRANSPARENT};
//!
//! let pixels = render_svg(
//!     "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'/>",
//!     AUTO_SIZE,
//!     AUTO_SIZE,
//!     TRANSPARENT,
//! )?;
//! assert_eq!(pixels.dim(), (10, 10, 4));
//! # Ok::<(), novasvg::NovaError>(())
//! ```
//!
//! Array conversions for engine types come from the [`ToArray`] and
//! [`RenderToArray`] traits; bring them into scope to use them.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod array;
#[cfg(feature = "export")]
pub mod export;
pub mod source;

use std::path::Path;

use ndarray::{Array3, ArrayView3};

pub use array::{array_to_bitmap, bitmap_to_array, RenderToArray, ToArray};
#[cfg(feature = "export")]
pub use export::{BitmapExporter, ExportConfig, ExportFormat};
pub use novasvg_core::{
    add_font_face_from_data, add_font_face_from_file, clear_font_faces, font_face_count,
    font_families, load_font_file, load_fonts_dir, load_system_fonts, version, version_string,
    Attribute, Bitmap, BoundingBox, Document, Element, Matrix, Node, NodeId, NovaError,
    NovaResult, Selector, TextNode,
};
pub use source::SvgSource;

/// Width or height that is derived from the document's intrinsic size.
pub const AUTO_SIZE: i32 = -1;

/// Fully transparent background, `0x00000000`.
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Facade version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load an SVG document from a file.
///
/// # Errors
///
/// Returns the engine's error for missing, unreadable or invalid files.
pub fn load(path: impl AsRef<Path>) -> NovaResult<Document> {
    Document::load_from_file(path)
}

/// Render an SVG to a straight-RGBA array of shape `(height, width, 4)`.
///
/// `source` may be a loaded [`Document`], a path, or text. Text is routed
/// by [`SvgSource::classify`]: markup if its first non-whitespace character
/// is `<`, otherwise a file path. `width` and `height` of [`AUTO_SIZE`] (or
/// any value `<= 0`) come from the intrinsic size. `background` is
/// `0xRRGGBBAA`.
///
/// # Errors
///
/// Returns the engine's load or render error unchanged.
pub fn render_svg<'a>(
    source: impl Into<SvgSource<'a>>,
    width: i32,
    height: i32,
    background: u32,
) -> NovaResult<Array3<u8>> {
    let source = source.into();
    let document = source.load()?;
    let bitmap = document.render_to_bitmap(width, height, background)?;
    tracing::debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        "rendered SVG to array"
    );
    bitmap_to_array(&bitmap)
}

/// Alias of [`render_svg`].
///
/// # Errors
///
/// See [`render_svg`].
pub fn svg_to_array<'a>(
    source: impl Into<SvgSource<'a>>,
    width: i32,
    height: i32,
    background: u32,
) -> NovaResult<Array3<u8>> {
    render_svg(source, width, height, background)
}

/// Build an affine matrix `(a b c d e f)`. No validation is performed.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub const fn create_matrix(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Matrix {
    Matrix::new(a, b, c, d, e, f)
}

/// Build a bitmap from a straight-RGBA array of shape `(height, width, 4)`.
///
/// # Errors
///
/// Returns the engine's error when the shape is not `height x width x 4`
/// or a dimension is zero.
pub fn create_bitmap_from_array(array: ArrayView3<'_, u8>) -> NovaResult<Bitmap> {
    array_to_bitmap(array)
}
