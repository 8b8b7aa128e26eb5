//! Bitmap export to image formats.
//!
//! PNG keeps the alpha channel. JPEG has none, so pixels are composited
//! over the configured background first.

use std::path::Path;

use image::ImageEncoder;
use novasvg_core::{Bitmap, NovaError, NovaResult};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
}

impl ExportFormat {
    /// Pick the format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Configuration for bitmap export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// JPEG quality 1-100 (default: 90).
    pub jpeg_quality: u8,
    /// Colour behind translucent pixels in formats without alpha, as RGBA bytes.
    pub background: [u8; 4],
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            background: [255, 255, 255, 255],
        }
    }
}

/// Encodes [`Bitmap`]s to image files.
pub struct BitmapExporter {
    config: ExportConfig,
}

impl BitmapExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Encode a bitmap in the given format.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Export`] if encoding fails.
    pub fn export(&self, bitmap: &Bitmap, format: ExportFormat) -> NovaResult<Vec<u8>> {
        match format {
            ExportFormat::Png => bitmap.encode_png(),
            ExportFormat::Jpeg => self.encode_jpeg(bitmap),
        }
    }

    /// Encode a bitmap and write it to `path`, picking the format from the
    /// extension.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Export`] for an unsupported extension or a
    /// failed encode, and [`NovaError::Io`] if writing fails.
    pub fn export_to_file(&self, bitmap: &Bitmap, path: impl AsRef<Path>) -> NovaResult<ExportFormat> {
        let path = path.as_ref();
        let format = ExportFormat::from_path(path).ok_or_else(|| {
            NovaError::Export(format!(
                "unsupported output format for {} (expected .png, .jpg or .jpeg)",
                path.display()
            ))
        })?;

        let bytes = self.export(bitmap, format)?;
        std::fs::write(path, &bytes)?;
        tracing::debug!(path = %path.display(), ?format, bytes = bytes.len(), "exported bitmap");
        Ok(format)
    }

    /// Encode a bitmap as JPEG, flattened onto the background.
    ///
    /// # Errors
    ///
    /// Returns [`NovaError::Export`] if encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn encode_jpeg(&self, bitmap: &Bitmap) -> NovaResult<Vec<u8>> {
        let (width, height) = (bitmap.width(), bitmap.height());
        let bg = &self.config.background;
        let mut rgb_data = Vec::with_capacity(width as usize * height as usize * 3);

        // Premultiplied source: out = src + bg * (1 - alpha).
        for pixel in bitmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for (&src, &back) in pixel[..3].iter().zip(&bg[..3]) {
                let value = f32::from(back).mul_add(inv, f32::from(src));
                rgb_data.push(value.round().min(255.0) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ColorType::Rgb8.into())
            .map_err(|e| NovaError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path("a/b.png"), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path("B.JPG"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path("c.jpeg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path("d.svg"), None);
        assert_eq!(ExportFormat::from_path("noext"), None);
    }

    #[test]
    fn test_png_export_produces_valid_bytes() {
        let bitmap = Bitmap::new(4, 4).expect("bitmap");
        let png = BitmapExporter::with_defaults()
            .export(&bitmap, ExportFormat::Png)
            .expect("png");
        assert_eq!(&png[0..4], &[137, 80, 78, 71]);
    }

    #[test]
    fn test_jpeg_export_produces_valid_bytes() {
        let mut bitmap = Bitmap::new(16, 16).expect("bitmap");
        bitmap.clear(0xFF00_0080);
        let jpeg = BitmapExporter::with_defaults()
            .export(&bitmap, ExportFormat::Jpeg)
            .expect("jpeg");
        // JPEG SOI marker
        assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_jpeg_flattens_onto_background() {
        let mut bitmap = Bitmap::new(8, 8).expect("bitmap");
        bitmap.clear(0xFF00_0080);
        let jpeg = BitmapExporter::new(ExportConfig {
            jpeg_quality: 100,
            ..ExportConfig::default()
        })
        .encode_jpeg(&bitmap)
        .expect("jpeg");

        let decoded = image::load_from_memory(&jpeg).expect("decode").to_rgb8();
        assert_eq!(decoded.dimensions(), (8, 8));
        // Half-transparent red over white.
        let pixel = decoded.get_pixel(4, 4).0;
        for (channel, expected) in pixel.into_iter().zip([255u8, 127, 127]) {
            assert!(channel.abs_diff(expected) <= 6, "pixel = {pixel:?}");
        }
    }

    #[test]
    fn test_export_to_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bitmap = Bitmap::new(2, 2).expect("bitmap");
        let result = BitmapExporter::with_defaults().export_to_file(&bitmap, dir.path().join("x.gif"));
        assert!(matches!(result, Err(NovaError::Export(_))));
    }

    #[test]
    fn test_export_to_file_writes_jpeg() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.jpeg");
        let bitmap = Bitmap::new(8, 8).expect("bitmap");
        let format = BitmapExporter::new(ExportConfig {
            jpeg_quality: 50,
            ..ExportConfig::default()
        })
        .export_to_file(&bitmap, &path)
        .expect("export");
        assert_eq!(format, ExportFormat::Jpeg);
        let bytes = std::fs::read(&path).expect("read back");
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }
}
