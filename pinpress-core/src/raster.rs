//! Raster Primitives
//!
//! Pixel-centre sampled shapes over `RgbaImage` with source-over blending
//! (non-premultiplied, rounded per channel).
//! No anti-aliasing: the same inputs always produce the same pixels.

use image::{Rgba, RgbaImage};
use std::f64::consts::TAU;

use crate::geometry::{PinGeometry, Placement};

pub const fn rgb(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// Canvas-style colour with a fractional alpha.
pub fn rgba(r: u8, g: u8, b: u8, alpha: f64) -> Rgba<u8> {
    Rgba([r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
}

/// Dash pattern along an arc, in surface pixels.
#[derive(Debug, Clone, Copy)]
pub struct Dash {
    pub on: f64,
    pub off: f64,
}

fn blend_over(dst: &Rgba<u8>, src: &Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        0 => return *dst,
        255 => return *src,
        _ => {}
    }
    let sa = src[3] as f64 / 255.0;
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src[c] as f64 * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    Rgba(out)
}

fn blend_at(canvas: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    let pixel = canvas.get_pixel_mut(x, y);
    *pixel = blend_over(pixel, &color);
}

/// Visit every pixel centre of the canvas.
fn for_each_centre(canvas: &mut RgbaImage, mut f: impl FnMut(&mut RgbaImage, u32, u32, f64, f64)) {
    let (w, h) = canvas.dimensions();
    for y in 0..h {
        for x in 0..w {
            f(canvas, x, y, x as f64 + 0.5, y as f64 + 0.5);
        }
    }
}

fn sample_bilinear(source: &RgbaImage, sx: f64, sy: f64) -> Rgba<u8> {
    let (w, h) = source.dimensions();
    let u = (sx - 0.5).clamp(0.0, (w - 1) as f64);
    let v = (sy - 0.5).clamp(0.0, (h - 1) as f64);
    let x0 = u.floor() as u32;
    let y0 = v.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = u - x0 as f64;
    let fy = v - y0 as f64;

    let p00 = source.get_pixel(x0, y0);
    let p10 = source.get_pixel(x1, y0);
    let p01 = source.get_pixel(x0, y1);
    let p11 = source.get_pixel(x1, y1);

    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        *slot = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }
    Rgba(out)
}

/// Draw `source` at `placement`, clipped to the outer circle of `geometry`.
pub fn draw_clipped(
    canvas: &mut RgbaImage,
    source: &RgbaImage,
    geometry: &PinGeometry,
    placement: &Placement,
) {
    let (sw, sh) = source.dimensions();
    if sw == 0 || sh == 0 || placement.scale <= 0.0 {
        return;
    }
    for_each_centre(canvas, |canvas, x, y, px, py| {
        if !geometry.inside_outer(px, py) {
            return;
        }
        let (sx, sy) = placement.source_point(px, py);
        if sx < 0.0 || sy < 0.0 || sx >= sw as f64 || sy >= sh as f64 {
            return;
        }
        blend_at(canvas, x, y, sample_bilinear(source, sx, sy));
    });
}

pub fn fill_disc(canvas: &mut RgbaImage, center: f64, radius: f64, color: Rgba<u8>) {
    fill_annulus(canvas, center, radius, 0.0, color);
}

/// Fill between `outer` and `inner` radii; `inner = 0` fills a disc.
pub fn fill_annulus(canvas: &mut RgbaImage, center: f64, outer: f64, inner: f64, color: Rgba<u8>) {
    for_each_centre(canvas, |canvas, x, y, px, py| {
        let d = (px - center).hypot(py - center);
        if d <= outer && (inner <= 0.0 || d > inner) {
            blend_at(canvas, x, y, color);
        }
    });
}

/// Stroke a circle centred on the surface. Dashes start at angle 0 and run
/// clockwise in screen space.
pub fn stroke_circle(
    canvas: &mut RgbaImage,
    center: f64,
    radius: f64,
    line_width: f64,
    color: Rgba<u8>,
    dash: Option<Dash>,
) {
    let half = line_width / 2.0;
    for_each_centre(canvas, |canvas, x, y, px, py| {
        let (ox, oy) = (px - center, py - center);
        if (ox.hypot(oy) - radius).abs() > half {
            return;
        }
        if let Some(dash) = dash {
            let mut angle = oy.atan2(ox);
            if angle < 0.0 {
                angle += TAU;
            }
            if (angle * radius) % (dash.on + dash.off) >= dash.on {
                return;
            }
        }
        blend_at(canvas, x, y, color);
    });
}

/// Top-left to bottom-right white sheen over the outer circle.
pub fn fill_diagonal_gloss(canvas: &mut RgbaImage, geometry: &PinGeometry) {
    let origin = geometry.center - geometry.outer_radius;
    let span = geometry.outer_radius * 4.0;
    for_each_centre(canvas, |canvas, x, y, px, py| {
        if !geometry.inside_outer(px, py) {
            return;
        }
        let t = (((px - origin) + (py - origin)) / span).clamp(0.0, 1.0);
        let alpha = if t <= 0.5 {
            0.4 * (1.0 - t / 0.5)
        } else {
            0.15 * ((t - 0.5) / 0.5)
        };
        blend_at(canvas, x, y, rgba(255, 255, 255, alpha));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_blend_over_transparent_keeps_source() {
        let out = blend_over(&Rgba([0, 0, 0, 0]), &rgba(10, 20, 30, 0.5));
        assert_eq!(out, Rgba([10, 20, 30, 128]));
        let out = blend_over(&rgb(0, 0, 0), &rgba(255, 255, 255, 0.2));
        assert_eq!(out, rgb(51, 51, 51));
    }

    #[test]
    fn test_fill_disc_stays_inside_radius() {
        let mut canvas = RgbaImage::new(20, 20);
        fill_disc(&mut canvas, 10.0, 5.0, rgb(255, 0, 0));
        assert_eq!(canvas.get_pixel(10, 10)[0], 255);
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(17, 10)[3], 0);
    }

    #[test]
    fn test_annulus_leaves_hole() {
        let mut canvas = RgbaImage::new(40, 40);
        fill_annulus(&mut canvas, 20.0, 18.0, 10.0, rgb(0, 0, 255));
        assert_eq!(canvas.get_pixel(20, 20)[3], 0);
        assert_eq!(canvas.get_pixel(20, 5)[2], 255);
    }

    #[test]
    fn test_dashed_stroke_has_gaps() {
        let mut canvas = RgbaImage::new(100, 100);
        stroke_circle(&mut canvas, 50.0, 40.0, 2.0, rgb(0, 0, 0), Some(Dash { on: 5.0, off: 5.0 }));
        let painted = canvas.pixels().filter(|p| p[3] > 0).count();
        let mut solid = RgbaImage::new(100, 100);
        stroke_circle(&mut solid, 50.0, 40.0, 2.0, rgb(0, 0, 0), None);
        let full = solid.pixels().filter(|p| p[3] > 0).count();
        assert!(painted > full / 3 && painted < full * 2 / 3);
    }

    #[test]
    fn test_draw_clipped_masks_corners() {
        let spec = Catalog::builtin().get("small").cloned().unwrap();
        let geometry = PinGeometry::new(40.0, 0.0, &spec);
        let source = RgbaImage::from_pixel(8, 8, rgb(0, 200, 0));
        let placement = geometry.place(8, 8, &Default::default(), 1.0);
        let mut canvas = RgbaImage::new(40, 40);
        draw_clipped(&mut canvas, &source, &geometry, &placement);
        assert_eq!(*canvas.get_pixel(20, 20), rgb(0, 200, 0));
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(39, 39)[3], 0);
    }

    #[test]
    fn test_gloss_brightest_top_left() {
        let spec = Catalog::builtin().get("small").cloned().unwrap();
        let geometry = PinGeometry::new(100.0, 0.0, &spec);
        let mut canvas = RgbaImage::from_pixel(100, 100, rgb(0, 0, 0));
        fill_diagonal_gloss(&mut canvas, &geometry);
        let upper = canvas.get_pixel(25, 25)[0];
        let middle = canvas.get_pixel(50, 50)[0];
        let lower = canvas.get_pixel(75, 75)[0];
        assert!(upper > lower && lower > middle);
    }
}
