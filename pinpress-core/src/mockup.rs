//! Interactive Mockup Renderer
//!
//! Owns the live [`ImageTransform`] while the customer edits. Pointer and
//! wheel input mutate it; every change is reported through the change
//! callback and shows up in the next [`MockupRenderer::render`].
//!
//! Decoding is the only step that may run elsewhere: [`MockupRenderer::select_image`]
//! hands out a [`DecodeJob`] tagged with a generation, and only the outcome
//! of the latest generation is accepted back.

use image::{ImageError, RgbaImage};
use serde::Serialize;

use crate::catalog::{Catalog, PhysicalSizeSpec, SizeId};
use crate::geometry::{clamp_scale, ImageTransform, PinGeometry, SCALE_STEP};
use crate::print::PrintSpec;
use crate::raster::{self, rgb, rgba, Dash};

const CUT_DASH: Dash = Dash { on: 5.0, off: 5.0 };

pub type ChangeCallback = Box<dyn FnMut(&ImageTransform)>;

/// Text the host draws over the frame; the crate does not rasterise fonts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub text: String,
    /// Centre of the text baseline.
    pub x: f64,
    pub y: f64,
    pub font_px: u32,
    pub color: String,
}

#[derive(Debug, Clone)]
pub struct PreviewFrame {
    pub image: RgbaImage,
    pub captions: Vec<Caption>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last_x: f64, last_y: f64 },
}

/// Source bytes waiting to be decoded for a given generation.
#[derive(Debug)]
pub struct DecodeJob {
    generation: u64,
    bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct DecodeOutcome {
    generation: u64,
    result: Result<RgbaImage, ImageError>,
}

impl DecodeJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn run(self) -> DecodeOutcome {
        let result = image::load_from_memory(&self.bytes).map(|img| img.to_rgba8());
        DecodeOutcome {
            generation: self.generation,
            result,
        }
    }
}

pub struct MockupRenderer {
    catalog: Catalog,
    spec: PrintSpec,
    size_id: SizeId,
    transform: ImageTransform,
    drag: DragState,
    has_image: bool,
    bitmap: Option<RgbaImage>,
    generation: u64,
    on_change: Option<ChangeCallback>,
}

impl MockupRenderer {
    pub fn new(catalog: Catalog, spec: PrintSpec, size_id: impl Into<SizeId>) -> Self {
        Self {
            catalog,
            spec,
            size_id: size_id.into(),
            transform: ImageTransform::identity(),
            drag: DragState::Idle,
            has_image: false,
            bitmap: None,
            generation: 0,
            on_change: None,
        }
    }

    pub fn on_change(&mut self, callback: impl FnMut(&ImageTransform) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    /// Copy of the current transform for handing to an order.
    pub fn snapshot(&self) -> ImageTransform {
        self.transform
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn is_ready(&self) -> bool {
        self.bitmap.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> Option<&PhysicalSizeSpec> {
        self.catalog.get(&self.size_id)
    }

    pub fn geometry(&self) -> Option<PinGeometry> {
        self.size().map(|spec| {
            PinGeometry::new(
                self.spec.preview_side as f64,
                self.spec.preview_margin as f64,
                spec,
            )
        })
    }

    fn emit(&mut self) {
        let transform = self.transform;
        if let Some(callback) = self.on_change.as_mut() {
            callback(&transform);
        }
    }

    fn update(&mut self, next: ImageTransform) {
        if next != self.transform {
            self.transform = next;
            self.emit();
        }
    }

    fn reset(&mut self) {
        self.transform = ImageTransform::identity();
        self.drag = DragState::Idle;
        self.emit();
    }

    /// Swap the source image. Any decode still in flight becomes stale.
    pub fn select_image(&mut self, bytes: Option<Vec<u8>>) -> Option<DecodeJob> {
        self.generation += 1;
        self.bitmap = None;
        self.has_image = bytes.is_some();
        self.reset();
        bytes.map(|bytes| DecodeJob {
            generation: self.generation,
            bytes,
        })
    }

    /// Accept a finished decode. Returns `false` for stale or failed decodes.
    pub fn complete_decode(&mut self, outcome: DecodeOutcome) -> bool {
        if outcome.generation != self.generation || !self.has_image {
            tracing::debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding superseded decode"
            );
            return false;
        }
        match outcome.result {
            Ok(bitmap) => {
                self.bitmap = Some(bitmap);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "source image failed to decode");
                false
            }
        }
    }

    /// Select and decode in one step.
    pub fn load_image(&mut self, bytes: Vec<u8>) -> bool {
        match self.select_image(Some(bytes)) {
            Some(job) => {
                let outcome = job.run();
                self.complete_decode(outcome)
            }
            None => false,
        }
    }

    pub fn select_size(&mut self, size_id: impl Into<SizeId>) {
        self.size_id = size_id.into();
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let side = self.spec.preview_side as f64;
        if !self.has_image || x < 0.0 || y < 0.0 || x >= side || y >= side {
            return;
        }
        self.drag = DragState::Dragging { last_x: x, last_y: y };
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let DragState::Dragging { last_x, last_y } = self.drag else {
            return;
        };
        self.drag = DragState::Dragging { last_x: x, last_y: y };
        self.update(ImageTransform {
            x: self.transform.x + (x - last_x),
            y: self.transform.y + (y - last_y),
            ..self.transform
        });
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.drag = DragState::Idle;
    }

    /// One wheel tick. Scrolling down (positive delta) zooms out.
    pub fn wheel(&mut self, delta_y: f64) {
        if !self.has_image || delta_y == 0.0 || delta_y.is_nan() {
            return;
        }
        let scale = clamp_scale(self.transform.scale - delta_y.signum() * SCALE_STEP);
        self.update(ImageTransform { scale, ..self.transform });
    }

    /// Zoom slider input.
    pub fn set_scale(&mut self, value: f64) {
        if !self.has_image || value.is_nan() {
            return;
        }
        self.update(ImageTransform {
            scale: clamp_scale(value),
            ..self.transform
        });
    }

    pub fn zoom_label(&self) -> String {
        format!("{:.0}%", self.transform.scale * 100.0)
    }

    pub fn caption_label(&self) -> Option<String> {
        self.size().map(|spec| format!("Preview ({})", spec.label))
    }

    /// Draw the current state. `None` while the size id is unknown.
    pub fn render(&self) -> Option<PreviewFrame> {
        let geometry = self.geometry()?;
        let side = self.spec.preview_side;
        let mut image = RgbaImage::new(side, side);

        if !self.has_image {
            let captions = draw_placeholder(&mut image, &geometry);
            return Some(PreviewFrame { image, captions });
        }

        if let Some(bitmap) = &self.bitmap {
            let placement = geometry.place(bitmap.width(), bitmap.height(), &self.transform, 1.0);
            raster::draw_clipped(&mut image, bitmap, &geometry, &placement);
            draw_overlays(&mut image, &geometry);
        }
        Some(PreviewFrame {
            image,
            captions: vec![],
        })
    }
}

fn draw_placeholder(image: &mut RgbaImage, g: &PinGeometry) -> Vec<Caption> {
    raster::fill_disc(image, g.center, g.outer_radius, rgb(0xf3, 0xf4, 0xf6));
    raster::stroke_circle(image, g.center, g.outer_radius, 2.0, rgb(0xd1, 0xd5, 0xdb), Some(CUT_DASH));
    raster::fill_disc(image, g.center, g.inner_radius, rgb(0xff, 0xff, 0xff));
    raster::stroke_circle(image, g.center, g.inner_radius, 2.0, rgb(0xe5, 0xe7, 0xeb), None);

    vec![
        Caption {
            text: "Area Pin".to_string(),
            x: g.center,
            y: g.center - 10.0,
            font_px: 14,
            color: "#9ca3af".to_string(),
        },
        Caption {
            text: "Drag & Zoom to Adjust".to_string(),
            x: g.center,
            y: g.center + 10.0,
            font_px: 12,
            color: "#9ca3af".to_string(),
        },
    ]
}

fn draw_overlays(image: &mut RgbaImage, g: &PinGeometry) {
    // bleed
    raster::fill_annulus(image, g.center, g.outer_radius, g.inner_radius, rgba(0, 0, 0, 0.2));
    raster::stroke_circle(image, g.center, g.outer_radius, 2.0, rgba(0, 0, 0, 0.4), Some(CUT_DASH));
    raster::stroke_circle(image, g.center, g.inner_radius, 1.0, rgba(255, 255, 255, 0.9), None);
    raster::fill_diagonal_gloss(image, g);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;

    fn png_bytes(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn renderer() -> MockupRenderer {
        MockupRenderer::new(Catalog::builtin(), PrintSpec::default(), "small")
    }

    #[test]
    fn test_placeholder_without_image() {
        let r = renderer();
        let frame = r.render().unwrap();
        assert_eq!(frame.image.dimensions(), (400, 400));
        assert_eq!(frame.captions.len(), 2);
        assert_eq!(frame.captions[0].text, "Area Pin");
        assert_eq!(frame.captions[1].y, 210.0);
        // face guide is white, bleed area is neutral grey
        assert_eq!(*frame.image.get_pixel(200, 200), rgb(255, 255, 255));
        assert_eq!(*frame.image.get_pixel(200, 25), rgb(0xf3, 0xf4, 0xf6));
        assert_eq!(frame.image.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_unknown_size_renders_nothing() {
        let mut r = renderer();
        r.select_size("jumbo");
        assert!(r.render().is_none());
        assert!(r.caption_label().is_none());
    }

    #[test]
    fn test_image_render_draws_bleed_ring() {
        let mut r = renderer();
        assert!(r.load_image(png_bytes(50, 50, [0, 0, 255, 255])));
        let frame = r.render().unwrap();
        assert!(frame.captions.is_empty());
        // inside the face: gloss only, still mostly blue
        let face = frame.image.get_pixel(200, 200);
        assert!(face[2] > 200);
        // bleed ring darkens blue before gloss
        let bleed = frame.image.get_pixel(200, 385);
        assert!(bleed[2] < face[2]);
        assert_eq!(frame.image.get_pixel(1, 1)[3], 0);
    }

    #[test]
    fn test_wheel_clamps() {
        let mut r = renderer();
        r.load_image(png_bytes(4, 4, [1, 2, 3, 255]));
        for _ in 0..100 {
            r.wheel(-120.0);
        }
        assert_eq!(r.transform().scale, 5.0);
        for _ in 0..100 {
            r.wheel(53.0);
        }
        assert_eq!(r.transform().scale, 0.5);
        r.wheel(0.0);
        assert_eq!(r.transform().scale, 0.5);
    }

    #[test]
    fn test_slider_clamps() {
        let mut r = renderer();
        r.load_image(png_bytes(4, 4, [1, 2, 3, 255]));
        r.set_scale(7.5);
        assert_eq!(r.transform().scale, 5.0);
        r.set_scale(0.0);
        assert_eq!(r.transform().scale, 0.5);
        r.set_scale(2.3);
        assert_eq!(r.transform().scale, 2.3);
        assert_eq!(r.zoom_label(), "230%");
    }

    #[test]
    fn test_input_ignored_without_image() {
        let mut r = renderer();
        r.wheel(-1.0);
        r.set_scale(3.0);
        r.pointer_down(10.0, 10.0);
        r.pointer_move(50.0, 50.0);
        assert_eq!(*r.transform(), ImageTransform::identity());
        assert!(!r.is_dragging());
    }

    #[test]
    fn test_pan_sums_deltas_between_drags() {
        let mut r = renderer();
        r.load_image(png_bytes(4, 4, [1, 2, 3, 255]));
        r.pointer_down(100.0, 100.0);
        r.pointer_move(110.0, 95.0);
        r.pointer_move(130.0, 90.0);
        r.pointer_up();
        // moves while idle are ignored
        r.pointer_move(300.0, 300.0);
        r.pointer_down(10.0, 10.0);
        r.pointer_move(5.0, 20.0);
        r.pointer_leave();
        r.pointer_move(0.0, 0.0);
        assert_eq!(r.transform().x, 25.0);
        assert_eq!(r.transform().y, 0.0);
    }

    #[test]
    fn test_pointer_down_outside_surface_does_not_drag() {
        let mut r = renderer();
        r.load_image(png_bytes(4, 4, [1, 2, 3, 255]));
        r.pointer_down(400.0, 10.0);
        assert!(!r.is_dragging());
        r.pointer_down(-1.0, 10.0);
        assert!(!r.is_dragging());
    }

    #[test]
    fn test_new_image_resets_transform_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut r = renderer();
        r.on_change(move |t| sink.borrow_mut().push(*t));

        r.load_image(png_bytes(4, 4, [1, 2, 3, 255]));
        r.set_scale(3.0);
        r.pointer_down(0.0, 0.0);
        r.pointer_move(7.0, 9.0);
        r.load_image(png_bytes(8, 8, [9, 9, 9, 255]));

        assert_eq!(*r.transform(), ImageTransform::identity());
        assert!(!r.is_dragging());
        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1].scale, 3.0);
        assert_eq!(seen[2], ImageTransform { scale: 3.0, x: 7.0, y: 9.0 });
        assert_eq!(*seen.last().unwrap(), ImageTransform::identity());
    }

    #[test]
    fn test_stale_decode_is_discarded() {
        let mut r = renderer();
        let first = r.select_image(Some(png_bytes(4, 4, [255, 0, 0, 255]))).unwrap();
        let second = r.select_image(Some(png_bytes(4, 4, [0, 255, 0, 255]))).unwrap();
        assert!(second.generation() > first.generation());

        let late = first.run();
        let fresh = second.run();
        assert!(r.complete_decode(fresh));
        assert!(!r.complete_decode(late));

        let frame = r.render().unwrap();
        let face = frame.image.get_pixel(200, 200);
        assert!(face[1] > face[0]);
    }

    #[test]
    fn test_decode_after_clearing_image_is_discarded() {
        let mut r = renderer();
        let job = r.select_image(Some(png_bytes(4, 4, [255, 0, 0, 255]))).unwrap();
        r.select_image(None);
        assert!(!r.complete_decode(job.run()));
        assert_eq!(r.render().unwrap().captions.len(), 2);
    }

    #[test]
    fn test_decode_failure_renders_empty_surface() {
        let mut r = renderer();
        assert!(!r.load_image(b"not an image".to_vec()));
        assert!(r.has_image());
        assert!(!r.is_ready());
        let frame = r.render().unwrap();
        assert!(frame.image.pixels().all(|p| p[3] == 0));
    }
}
