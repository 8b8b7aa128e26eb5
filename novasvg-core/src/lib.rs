//! # NovaSVG Core
//!
//! The SVG engine behind NovaSVG: a mutable document tree with CSS
//! selector queries, element geometry, rendering into RGBA bitmaps and a
//! process-wide font registry.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 novasvg-core                │
//! ├─────────────────────────────────────────────┤
//! │  Document Tree   │  Layout                  │
//! │  - Elements      │  - usvg render tree      │
//! │  - Text nodes    │  - Matrices and boxes    │
//! │  - Selectors     │  - Font registry         │
//! ├─────────────────────────────────────────────┤
//! │  Rasterization (resvg + tiny-skia)          │
//! │  - Document and element rendering           │
//! │  - Premultiplied RGBA bitmaps, PNG output   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ```no_run
//! use novasvg_core::Document;
//!
//! let doc = Document::load_from_file("logo.svg")?;
//! let bitmap = doc.render_to_bitmap(256, -1, 0x0000_0000)?;
//! bitmap.write_to_png("logo.png")?;
//! # Ok::<(), novasvg_core::NovaError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bitmap;
pub mod document;
pub mod error;
pub mod fonts;
pub mod geometry;
pub mod node;
pub mod selector;
pub mod tree;

mod writer;

pub use bitmap::{color_from_rgba, Bitmap, CHANNELS};
pub use document::Document;
pub use error::{NovaError, NovaResult};
pub use fonts::{
    add_font_face_from_data, add_font_face_from_file, clear_font_faces, font_face_count,
    font_families, load_font_file, load_fonts_dir, load_system_fonts,
};
pub use geometry::{BoundingBox, Matrix};
pub use node::{Element, Node, TextNode};
pub use selector::Selector;
pub use tree::{Attribute, NodeId};

/// Engine version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[allow(clippy::cast_lossless)]
const fn parse_component(text: &str) -> u32 {
    let bytes = text.as_bytes();
    let mut value = 0;
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}

const VERSION_CODE: u32 = parse_component(env!("CARGO_PKG_VERSION_MAJOR")) * 10_000
    + parse_component(env!("CARGO_PKG_VERSION_MINOR")) * 100
    + parse_component(env!("CARGO_PKG_VERSION_PATCH"));

/// Engine version encoded as `major * 10000 + minor * 100 + patch`.
#[must_use]
pub const fn version() -> u32 {
    VERSION_CODE
}

/// Engine version as `major.minor.patch`.
#[must_use]
pub const fn version_string() -> &'static str {
    VERSION
}
