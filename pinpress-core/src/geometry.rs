//! Pin Geometry - One Model For Preview And Print
//!
//! The preview surface and the print canvas differ only in side length,
//! margin and the unit of the stored pan offset. Everything else goes
//! through [`PinGeometry::place`].

use serde::{Deserialize, Serialize};

use crate::catalog::PhysicalSizeSpec;

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 5.0;
/// Zoom change per wheel tick.
pub const SCALE_STEP: f64 = 0.1;

pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// User pan/zoom relative to the cover-scaled image.
///
/// `x`/`y` are in preview surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    pub scale: f64,
    pub x: f64,
    pub y: f64,
}

impl ImageTransform {
    pub const fn identity() -> Self {
        Self { scale: 1.0, x: 0.0, y: 0.0 }
    }
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Circle layout on a square surface of side `side`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinGeometry {
    pub side: f64,
    pub center: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
}

/// Where the scaled image lands on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub dx: f64,
    pub dy: f64,
    pub width: f64,
    pub height: f64,
    /// Source pixels to surface pixels.
    pub scale: f64,
}

impl PinGeometry {
    pub fn new(side: f64, margin: f64, spec: &PhysicalSizeSpec) -> Self {
        let outer_radius = side / 2.0 - margin;
        Self {
            side,
            center: side / 2.0,
            outer_radius,
            inner_radius: outer_radius * spec.face_ratio(),
        }
    }

    /// Smallest scale at which the image covers the outer circle.
    pub fn cover_scale(&self, img_w: u32, img_h: u32) -> f64 {
        let diameter = self.outer_radius * 2.0;
        (diameter / img_w as f64).max(diameter / img_h as f64)
    }

    /// Center the cover-scaled image, apply the zoom, then shift by the
    /// stored offset multiplied by `offset_ratio`.
    pub fn place(
        &self,
        img_w: u32,
        img_h: u32,
        transform: &ImageTransform,
        offset_ratio: f64,
    ) -> Placement {
        let scale = self.cover_scale(img_w, img_h) * transform.scale;
        let width = img_w as f64 * scale;
        let height = img_h as f64 * scale;
        Placement {
            dx: self.center - width / 2.0 + transform.x * offset_ratio,
            dy: self.center - height / 2.0 + transform.y * offset_ratio,
            width,
            height,
            scale,
        }
    }

    pub fn distance_from_center(&self, px: f64, py: f64) -> f64 {
        (px - self.center).hypot(py - self.center)
    }

    pub fn inside_outer(&self, px: f64, py: f64) -> bool {
        self.distance_from_center(px, py) <= self.outer_radius
    }
}

impl Placement {
    /// Map a surface point back into source image coordinates.
    pub fn source_point(&self, px: f64, py: f64) -> (f64, f64) {
        ((px - self.dx) / self.scale, (py - self.dy) / self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn small() -> PhysicalSizeSpec {
        Catalog::builtin().get("small").cloned().unwrap()
    }

    #[test]
    fn test_preview_radii() {
        let g = PinGeometry::new(400.0, 10.0, &small());
        assert_eq!(g.outer_radius, 190.0);
        assert!((g.inner_radius - 152.0).abs() < 1e-9);
        assert_eq!(g.center, 200.0);
    }

    #[test]
    fn test_cover_scale_uses_short_side() {
        let g = PinGeometry::new(400.0, 10.0, &small());
        // 760x380 image: height is the limiting side
        assert_eq!(g.cover_scale(760, 380), 1.0);
        assert_eq!(g.cover_scale(380, 1000), 1.0);
        assert_eq!(g.cover_scale(190, 190), 2.0);
    }

    #[test]
    fn test_identity_placement_is_centered() {
        let g = PinGeometry::new(400.0, 10.0, &small());
        let p = g.place(380, 380, &ImageTransform::identity(), 1.0);
        assert_eq!(p.dx, 10.0);
        assert_eq!(p.dy, 10.0);
        assert_eq!(p.width, 380.0);
    }

    #[test]
    fn test_offset_ratio_scales_pan_only() {
        let g = PinGeometry::new(800.0, 0.0, &small());
        let t = ImageTransform { scale: 2.0, x: 10.0, y: -5.0 };
        let a = g.place(400, 400, &t, 1.0);
        let b = g.place(400, 400, &t, 2.0);
        assert_eq!(a.width, b.width);
        assert_eq!(b.dx - a.dx, 10.0);
        assert_eq!(b.dy - a.dy, -5.0);
    }

    #[test]
    fn test_source_point_inverts_placement() {
        let g = PinGeometry::new(400.0, 10.0, &small());
        let p = g.place(100, 50, &ImageTransform { scale: 1.5, x: 3.0, y: 4.0 }, 1.0);
        let (sx, sy) = p.source_point(p.dx + p.scale * 20.0, p.dy + p.scale * 10.0);
        assert!((sx - 20.0).abs() < 1e-9);
        assert!((sy - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_scale_bounds() {
        assert_eq!(clamp_scale(0.1), MIN_SCALE);
        assert_eq!(clamp_scale(9.0), MAX_SCALE);
        assert_eq!(clamp_scale(1.3), 1.3);
    }
}
