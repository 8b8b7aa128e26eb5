//! Engine error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type NovaResult<T> = Result<T, NovaError>;

/// Errors that can occur while loading, querying or rendering SVG.
#[derive(Debug, Error)]
pub enum NovaError {
    /// A file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Input bytes were not valid UTF-8.
    #[error("SVG data is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The markup is not well-formed XML.
    #[error("Malformed SVG markup: {0}")]
    Parse(String),

    /// The document root is not an `svg` element.
    #[error("Not an SVG document: root element is <{0}>")]
    NotSvg(String),

    /// The document could not be laid out into a render tree.
    #[error("SVG layout failed: {0}")]
    Layout(String),

    /// A bitmap or render target would have no pixels.
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    /// A pixel buffer does not describe a height x width x 4 RGBA image.
    #[error("Invalid pixel buffer: {0}")]
    InvalidBuffer(String),

    /// A CSS selector could not be parsed.
    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector {
        /// The selector text.
        selector: String,
        /// What went wrong.
        reason: String,
    },

    /// A node handle was used for an operation its kind does not support.
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// Font data could not be registered.
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    /// Encoding a bitmap failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
