//! Owned RGBA pixel buffers.
//!
//! Pixels are stored premultiplied (the tiny-skia native format). Conversions
//! to and from straight RGBA happen at the edges, so a translucent pixel
//! round-trips up to premultiplication rounding and a fully transparent pixel
//! always comes back as `[0, 0, 0, 0]`.

use std::path::Path;

use tiny_skia::{Color, ColorU8, Pixmap};

use crate::error::{NovaError, NovaResult};

/// Bytes per pixel.
pub const CHANNELS: usize = 4;

/// Convert a packed `0xRRGGBBAA` value into a tiny-skia colour.
#[must_use]
pub fn color_from_rgba(value: u32) -> Color {
    let [r, g, b, a] = value.to_be_bytes();
    Color::from_rgba8(r, g, b, a)
}

/// A rasterized image owned by the engine.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pixmap: Pixmap,
}

impl Bitmap {
    /// Allocate a transparent bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidSize`] if either dimension is zero or the
    /// buffer would be too large.
    pub fn new(width: u32, height: u32) -> NovaResult<Self> {
        Pixmap::new(width, height)
            .map(|pixmap| Self { pixmap })
            .ok_or_else(|| {
                NovaError::InvalidSize(format!("cannot allocate a {width}x{height} bitmap"))
            })
    }

    /// Build a bitmap from a row-major `height x width x channels` buffer of
    /// straight (non-premultiplied) RGBA bytes.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::InvalidBuffer`] unless `channels` is 4 and
    /// `data.len()` matches the shape, and [`NovaError::InvalidSize`] for a
    /// zero dimension.
    pub fn from_rgba_buffer(
        height: usize,
        width: usize,
        channels: usize,
        data: &[u8],
    ) -> NovaResult<Self> {
        if channels != CHANNELS {
            return Err(NovaError::InvalidBuffer(format!(
                "expected {CHANNELS} channels, got {channels}"
            )));
        }

        let expected = height
            .checked_mul(width)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| NovaError::InvalidBuffer(format!("{height}x{width} overflows")))?;
        if data.len() != expected {
            return Err(NovaError::InvalidBuffer(format!(
                "{height}x{width}x{CHANNELS} needs {expected} bytes, got {}",
                data.len()
            )));
        }

        let to_u32 = |value: usize| {
            u32::try_from(value)
                .map_err(|_| NovaError::InvalidSize(format!("dimension {value} is too large")))
        };
        let mut bitmap = Self::new(to_u32(width)?, to_u32(height)?)?;

        for (pixel, rgba) in bitmap
            .pixmap
            .pixels_mut()
            .iter_mut()
            .zip(data.chunks_exact(CHANNELS))
        {
            *pixel = ColorU8::from_rgba(rgba[0], rgba[1], rgba[2], rgba[3]).premultiply();
        }

        Ok(bitmap)
    }

    pub(crate) fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Bytes per row.
    #[must_use]
    pub fn stride(&self) -> u32 {
        self.pixmap.width() * 4
    }

    /// Raw premultiplied RGBA bytes, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Fill every pixel with a `0xRRGGBBAA` colour.
    pub fn clear(&mut self, color: u32) {
        self.pixmap.fill(color_from_rgba(color));
    }

    /// Straight (non-premultiplied) RGBA bytes, row-major.
    #[must_use]
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixmap
            .pixels()
            .iter()
            .flat_map(|pixel| {
                let c = pixel.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    /// Encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Export`] if encoding fails.
    pub fn encode_png(&self) -> NovaResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| NovaError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Encode as PNG and write to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn write_to_png(&self, path: impl AsRef<Path>) -> NovaResult<()> {
        let png = self.encode_png()?;
        std::fs::write(path.as_ref(), png)?;
        tracing::debug!(path = %path.as_ref().display(), "wrote PNG");
        Ok(())
    }
}
