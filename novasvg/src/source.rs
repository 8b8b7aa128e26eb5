//! Where an SVG comes from: a file, inline markup or an already loaded document.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use novasvg_core::{Document, NovaResult};

/// Input accepted by [`crate::render_svg`].
///
/// Text converts through [`SvgSource::classify`]. Construct a variant
/// directly when the kind of input is already known.
#[derive(Debug, Clone, Copy)]
pub enum SvgSource<'a> {
    /// Path to an SVG file.
    FilePath(&'a Path),
    /// SVG markup.
    InlineMarkup(&'a str),
    /// A loaded document, rendered as is.
    Document(&'a Document),
}

impl<'a> SvgSource<'a> {
    /// Decide whether `text` is markup or a file path.
    ///
    /// Text whose first non-whitespace character is `<` is markup; anything
    /// else is a path. Markup behind a byte-order mark or a leading comment
    /// written without `<` is therefore treated as a path.
    #[must_use]
    pub fn classify(text: &'a str) -> Self {
        if text.trim_start().starts_with('<') {
            SvgSource::InlineMarkup(text)
        } else {
            SvgSource::FilePath(Path::new(text))
        }
    }

    /// Load the document, borrowing it when one was given.
    ///
    /// # Errors
    ///
    /// Returns the engine's load error for files and markup.
    pub fn load(self) -> NovaResult<Cow<'a, Document>> {
        match self {
            SvgSource::Document(doc) => Ok(Cow::Borrowed(doc)),
            SvgSource::InlineMarkup(markup) => {
                tracing::debug!(bytes = markup.len(), "loading inline SVG markup");
                Document::load_from_data(markup).map(Cow::Owned)
            }
            SvgSource::FilePath(path) => {
                tracing::debug!(path = %path.display(), "loading SVG file");
                Document::load_from_file(path).map(Cow::Owned)
            }
        }
    }
}

impl<'a> From<&'a str> for SvgSource<'a> {
    fn from(text: &'a str) -> Self {
        Self::classify(text)
    }
}

impl<'a> From<&'a String> for SvgSource<'a> {
    fn from(text: &'a String) -> Self {
        Self::classify(text)
    }
}

impl<'a> From<&'a Path> for SvgSource<'a> {
    fn from(path: &'a Path) -> Self {
        SvgSource::FilePath(path)
    }
}

impl<'a> From<&'a PathBuf> for SvgSource<'a> {
    fn from(path: &'a PathBuf) -> Self {
        SvgSource::FilePath(path)
    }
}

impl<'a> From<&'a Document> for SvgSource<'a> {
    fn from(doc: &'a Document) -> Self {
        SvgSource::Document(doc)
    }
}
