//! Affine matrices and axis-aligned boxes.

use std::ops::Mul;

use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a matrix is singular.
const DETERMINANT_EPSILON: f32 = 1e-12;

/// A 2x3 affine transform in the SVG `matrix(a b c d e f)` convention.
///
/// A point is mapped as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[allow(clippy::many_single_char_names)]
pub struct Matrix {
    /// Horizontal scale.
    pub a: f32,
    /// Vertical shear.
    pub b: f32,
    /// Horizontal shear.
    pub c: f32,
    /// Vertical scale.
    pub d: f32,
    /// Horizontal translation.
    pub e: f32,
    /// Vertical translation.
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

#[allow(clippy::many_single_char_names)]
impl Matrix {
    /// Create a matrix from its six components. No validation is performed.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity transform.
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// A pure translation.
    #[must_use]
    pub const fn translated(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// A pure scale.
    #[must_use]
    pub const fn scaled(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// A rotation by `angle` degrees around `(cx, cy)`.
    #[must_use]
    pub fn rotated(angle: f32, cx: f32, cy: f32) -> Self {
        let (sin, cos) = angle.to_radians().sin_cos();
        let rotation = Self::new(cos, sin, -sin, cos, 0.0, 0.0);
        if cx == 0.0 && cy == 0.0 {
            return rotation;
        }
        Self::translated(cx, cy) * rotation * Self::translated(-cx, -cy)
    }

    /// A skew by `shx` degrees along x and `shy` degrees along y.
    #[must_use]
    pub fn sheared(shx: f32, shy: f32) -> Self {
        Self::new(
            1.0,
            shy.to_radians().tan(),
            shx.to_radians().tan(),
            1.0,
            0.0,
            0.0,
        )
    }

    /// Returns `self * other`: the transform that applies `other` first, then `self`.
    #[must_use]
    pub fn pre_concat(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Returns `other * self`: the transform that applies `self` first, then `other`.
    #[must_use]
    pub fn post_concat(&self, other: &Self) -> Self {
        other.pre_concat(self)
    }

    /// Concatenate `other` so that it is applied to points before the current transform.
    pub fn multiply(&mut self, other: &Self) -> &mut Self {
        *self = self.pre_concat(other);
        self
    }

    /// Apply a translation before the current transform.
    pub fn translate(&mut self, tx: f32, ty: f32) -> &mut Self {
        self.multiply(&Self::translated(tx, ty))
    }

    /// Apply a scale before the current transform.
    pub fn scale(&mut self, sx: f32, sy: f32) -> &mut Self {
        self.multiply(&Self::scaled(sx, sy))
    }

    /// Apply a rotation (degrees, around `(cx, cy)`) before the current transform.
    pub fn rotate(&mut self, angle: f32, cx: f32, cy: f32) -> &mut Self {
        self.multiply(&Self::rotated(angle, cx, cy))
    }

    /// Apply a skew (degrees) before the current transform.
    pub fn shear(&mut self, shx: f32, shy: f32) -> &mut Self {
        self.multiply(&Self::sheared(shx, shy))
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) -> &mut Self {
        *self = Self::identity();
        self
    }

    /// The determinant of the linear part.
    #[must_use]
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Returns the inverse transform, or `None` if the matrix is singular.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det.abs() <= DETERMINANT_EPSILON || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Invert in place. Returns `false` and leaves the matrix untouched if it is singular.
    pub fn invert(&mut self) -> bool {
        match self.inverse() {
            Some(inverse) => {
                *self = inverse;
                true
            }
            None => false,
        }
    }

    /// Whether this is exactly the identity transform.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Map a point through the transform.
    #[must_use]
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Map a box through the transform, returning the bounds of its four corners.
    #[must_use]
    pub fn map_rect(&self, rect: &BoundingBox) -> BoundingBox {
        rect.transformed(self)
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Matrix {
        self.pre_concat(&rhs)
    }
}

impl From<Matrix> for tiny_skia::Transform {
    fn from(m: Matrix) -> Self {
        tiny_skia::Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
    }
}

impl From<tiny_skia::Transform> for Matrix {
    fn from(t: tiny_skia::Transform) -> Self {
        Self::new(t.sx, t.ky, t.kx, t.sy, t.tx, t.ty)
    }
}

/// An axis-aligned box: origin plus width and height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub w: f32,
    /// Height.
    pub h: f32,
}

impl BoundingBox {
    /// Create a box from origin and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// True when the box covers no area.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    /// Whether the point lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }

    /// Bounds of the four corners after mapping them through `matrix`.
    #[must_use]
    pub fn transformed(&self, matrix: &Matrix) -> Self {
        let corners = [
            matrix.map_point(self.x, self.y),
            matrix.map_point(self.x + self.w, self.y),
            matrix.map_point(self.x, self.y + self.h),
            matrix.map_point(self.x + self.w, self.y + self.h),
        ];

        let (mut left, mut top) = corners[0];
        let (mut right, mut bottom) = corners[0];
        for &(x, y) in &corners[1..] {
            left = left.min(x);
            top = top.min(y);
            right = right.max(x);
            bottom = bottom.max(y);
        }

        Self::new(left, top, right - left, bottom - top)
    }

    /// Transform in place.
    pub fn transform(&mut self, matrix: &Matrix) -> &mut Self {
        *self = self.transformed(matrix);
        self
    }
}

impl From<tiny_skia::Rect> for BoundingBox {
    fn from(rect: tiny_skia::Rect) -> Self {
        Self::new(rect.x(), rect.y(), rect.width(), rect.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_json_field_names() {
        let matrix = Matrix::new(1.0, 0.0, 0.0, 2.0, 5.0, -3.0);
        let json = serde_json::to_value(matrix).expect("serialize");
        assert_eq!(json["d"], 2.0);
        assert_eq!(json["f"], -3.0);
        let back: Matrix = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, matrix);

        let bbox: BoundingBox =
            serde_json::from_str(r#"{"x":1.5,"y":2,"w":30,"h":40}"#).expect("deserialize");
        assert_eq!(bbox, BoundingBox::new(1.5, 2.0, 30.0, 40.0));
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_identity_default() {
        let m = Matrix::default();
        assert_eq!(m, Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0));
        assert!(m.is_identity());
        assert_eq!(m.map_point(3.0, 4.0), (3.0, 4.0));
    }

    #[test]
    fn test_translate_then_scale_applies_scale_first() {
        let mut m = Matrix::identity();
        m.translate(5.0, 10.0).scale(2.0, 2.0);
        assert_eq!(m.e, 5.0);
        assert_eq!(m.f, 10.0);
        assert_eq!(m.a, 2.0);
        assert_eq!(m.d, 2.0);
        assert_eq!(m.map_point(1.0, 1.0), (7.0, 12.0));

        m.reset();
        assert!(m.is_identity());
    }

    #[test]
    fn test_multiply_from_identity() {
        let mut m = Matrix::identity();
        m.multiply(&Matrix::translated(10.0, 20.0));
        assert_eq!(m.e, 10.0);
        assert_eq!(m.f, 20.0);
    }

    #[test]
    fn test_rotation_around_center() {
        let m = Matrix::rotated(90.0, 10.0, 10.0);
        let (x, y) = m.map_point(20.0, 10.0);
        assert!(approx(x, 10.0), "x = {x}");
        assert!(approx(y, 20.0), "y = {y}");
    }

    #[test]
    fn test_shear_uses_tangent() {
        let m = Matrix::sheared(45.0, 0.0);
        assert!(approx(m.c, 1.0));
        assert!(approx(m.b, 0.0));
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut m = Matrix::identity();
        m.translate(10.0, 20.0).scale(2.0, 3.0).rotate(45.0, 0.0, 0.0);
        let product = m * m.inverse().expect("invertible");
        assert!(approx(product.a, 1.0));
        assert!(approx(product.b, 0.0));
        assert!(approx(product.c, 0.0));
        assert!(approx(product.d, 1.0));
        assert!(approx(product.e, 0.0));
        assert!(approx(product.f, 0.0));

        let mut inverted = m;
        assert!(inverted.invert());
        let product = m * inverted;
        assert!(approx(product.a, 1.0));
        assert!(approx(product.d, 1.0));
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let mut m = Matrix::scaled(0.0, 1.0);
        assert!(m.inverse().is_none());
        assert!(!m.invert());
        assert_eq!(m, Matrix::scaled(0.0, 1.0));
    }

    #[test]
    fn test_box_transformed() {
        let mut m = Matrix::identity();
        m.translate(5.0, 10.0).scale(2.0, 3.0);
        let b = BoundingBox::new(10.0, 20.0, 30.0, 40.0).transformed(&m);
        assert_eq!(b, BoundingBox::new(25.0, 70.0, 60.0, 120.0));
    }

    #[test]
    fn test_box_transform_in_place() {
        let mut b = BoundingBox::new(10.0, 20.0, 30.0, 40.0);
        b.transform(&Matrix::translated(5.0, 10.0));
        assert_eq!(b.x, 15.0);
        assert_eq!(b.y, 30.0);
        assert!(b.contains(15.0, 30.0));
        assert!(!b.contains(0.0, 0.0));
    }

    #[test]
    fn test_box_rotated_bounds_grow() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 10.0).transformed(&Matrix::rotated(45.0, 0.0, 0.0));
        assert!(b.w > 14.0 && b.w < 14.2, "w = {}", b.w);
    }

    #[test]
    fn test_tiny_skia_conversion() {
        let m = Matrix::new(2.0, 0.5, 0.25, 3.0, 10.0, 20.0);
        let t: tiny_skia::Transform = m.into();
        assert_eq!(t.sx, 2.0);
        assert_eq!(t.ky, 0.5);
        assert_eq!(t.kx, 0.25);
        assert_eq!(t.tx, 10.0);
        assert_eq!(Matrix::from(t), m);
    }

    proptest! {
        #[test]
        fn prop_inverse_undoes_mapping(
            sx in 0.1f32..10.0,
            sy in 0.1f32..10.0,
            angle in -180.0f32..180.0,
            tx in -100.0f32..100.0,
            ty in -100.0f32..100.0,
            px in -50.0f32..50.0,
            py in -50.0f32..50.0,
        ) {
            let mut m = Matrix::identity();
            m.translate(tx, ty).rotate(angle, 0.0, 0.0).scale(sx, sy);
            let inverse = m.inverse().expect("non-singular");
            let (x, y) = m.map_point(px, py);
            let (bx, by) = inverse.map_point(x, y);
            prop_assert!((bx - px).abs() < 0.05, "{} vs {}", bx, px);
            prop_assert!((by - py).abs() < 0.05, "{} vs {}", by, py);
        }
    }
}
