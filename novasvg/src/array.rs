//! Conversions between engine bitmaps and `height x width x 4` arrays.

use ndarray::{Array3, ArrayView3};
use novasvg_core::{Bitmap, Document, Element, NovaError, NovaResult, CHANNELS};

/// Convert a bitmap into a straight-RGBA array of shape `(height, width, 4)`.
///
/// # Errors
///
/// Returns [`NovaError::InvalidBuffer`] if the bitmap data does not match
/// its dimensions.
pub fn bitmap_to_array(bitmap: &Bitmap) -> NovaResult<Array3<u8>> {
    let shape = (bitmap.height() as usize, bitmap.width() as usize, CHANNELS);
    Array3::from_shape_vec(shape, bitmap.to_rgba())
        .map_err(|e| NovaError::InvalidBuffer(e.to_string()))
}

/// Build a bitmap from a straight-RGBA array of shape `(height, width, 4)`.
///
/// Any memory layout is accepted; the engine validates the shape.
///
/// # Errors
///
/// Returns [`NovaError::InvalidBuffer`] when the last axis is not 4 and
/// [`NovaError::InvalidSize`] when a dimension is zero.
pub fn array_to_bitmap(array: ArrayView3<'_, u8>) -> NovaResult<Bitmap> {
    let (height, width, channels) = array.dim();
    match array.as_slice() {
        Some(data) => Bitmap::from_rgba_buffer(height, width, channels, data),
        None => {
            let data: Vec<u8> = array.iter().copied().collect();
            Bitmap::from_rgba_buffer(height, width, channels, &data)
        }
    }
}

/// Array export for bitmaps.
pub trait ToArray {
    /// The pixels as a straight-RGBA `(height, width, 4)` array.
    ///
    /// # Errors
    ///
    /// See [`bitmap_to_array`].
    fn to_array(&self) -> NovaResult<Array3<u8>>;
}

impl ToArray for Bitmap {
    fn to_array(&self) -> NovaResult<Array3<u8>> {
        bitmap_to_array(self)
    }
}

/// Render straight to an array.
///
/// Sizes and background follow `render_to_bitmap`: values of zero or less
/// are derived from the intrinsic size and the background is `0xRRGGBBAA`.
pub trait RenderToArray {
    /// Render and convert to a `(height, width, 4)` array.
    ///
    /// # Errors
    ///
    /// Returns the engine's render error.
    fn render_to_array(&self, width: i32, height: i32, background: u32) -> NovaResult<Array3<u8>>;
}

impl RenderToArray for Document {
    fn render_to_array(&self, width: i32, height: i32, background: u32) -> NovaResult<Array3<u8>> {
        bitmap_to_array(&self.render_to_bitmap(width, height, background)?)
    }
}

impl RenderToArray for Element<'_> {
    fn render_to_array(&self, width: i32, height: i32, background: u32) -> NovaResult<Array3<u8>> {
        bitmap_to_array(&self.render_to_bitmap(width, height, background)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, Axis, Slice};

    #[test]
    fn test_bitmap_to_array_shape_and_order() {
        let mut bitmap = Bitmap::new(3, 2).expect("bitmap");
        bitmap.clear(0x1020_30FF);
        let array = bitmap.to_array().expect("array");
        assert_eq!(array.dim(), (2, 3, 4));
        let pixel = array.index_axis(Axis(0), 1).index_axis(Axis(0), 2).to_vec();
        assert_eq!(pixel, [0x10, 0x20, 0x30, 0xFF]);
    }

    #[test]
    fn test_non_contiguous_view_is_accepted() {
        let full = Array::from_shape_fn((4, 6, 4), |(_, x, c)| {
            if c == 3 {
                255
            } else {
                u8::try_from(x * 10).expect("fits")
            }
        });
        let view = full.slice_axis(Axis(1), Slice::new(0, None, 2));
        assert!(view.as_slice().is_none());

        let bitmap = array_to_bitmap(view).expect("bitmap");
        assert_eq!((bitmap.width(), bitmap.height()), (3, 4));
        let back = bitmap.to_array().expect("array");
        assert_eq!(back, view);
    }

    #[test]
    fn test_wrong_channel_count() {
        let array = Array3::<u8>::zeros((2, 2, 3));
        assert!(matches!(
            array_to_bitmap(array.view()),
            Err(NovaError::InvalidBuffer(_))
        ));
    }
}
