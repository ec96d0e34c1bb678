//! Print Export - Single Entry Point For Print Files
//!
//! Re-applies the frozen transform at print density, encodes PNG and
//! stamps the density chunk. Overlays from the preview never reach the file.

use image::{ImageFormat, RgbaImage};
use serde::Serialize;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{PhysicalSizeSpec, ProductType};
use crate::geometry::{ImageTransform, PinGeometry};
use crate::hashing::{compute_job_hash, sha256_hex};
use crate::order::{ImageDataError, Order};
use crate::phys::{self, PhysChunk, PhysError};
use crate::print::PrintSpec;
use crate::raster;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Order {0} has no size details; print size cannot be computed")]
    MissingSize(Uuid),

    #[error("Unreadable image data: {0}")]
    ImageData(#[from] ImageDataError),

    #[error("Source image failed to decode: {0}")]
    Decode(#[source] image::ImageError),

    #[error("PNG encoding failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Density chunk injection failed: {0}")]
    Phys(#[from] PhysError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write print file: {0}")]
    Io(#[from] std::io::Error),
}

/// A finished print file, ready to hand to the host for saving.
#[derive(Debug, Clone, Serialize)]
pub struct PrintFile {
    pub order_id: Uuid,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub sha256: String,
    pub job_hash: String,
}

#[derive(Serialize)]
struct JobPayload<'a> {
    dpi: u32,
    preview_side: u32,
    transform: &'a ImageTransform,
    size: &'a PhysicalSizeSpec,
    product_type: ProductType,
    quantity: u32,
    name: &'a str,
}

/// Uppercase; anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// `<TYPE>_<NAME>_QTY<n>_SIZE<cm>CM.png`
pub fn print_filename(product: ProductType, name: &str, quantity: u32, outer_diameter_cm: f64) -> String {
    format!(
        "{}_{}_QTY{}_SIZE{}CM.png",
        product.code(),
        sanitize_name(name),
        quantity,
        outer_diameter_cm
    )
}

pub struct PrintExporter {
    spec: PrintSpec,
}

impl PrintExporter {
    pub fn new(spec: PrintSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &PrintSpec {
        &self.spec
    }

    /// Print canvas geometry: the canvas is the cut circle, no margin.
    pub fn geometry(&self, size: &PhysicalSizeSpec) -> PinGeometry {
        let width = self.spec.pixels_for_cm(size.outer_diameter_cm);
        PinGeometry::new(width as f64, 0.0, size)
    }

    /// Draw `source` at print resolution. Pan offsets are converted from
    /// preview pixels by `width / preview_side`.
    pub fn compose(
        &self,
        source: &RgbaImage,
        size: &PhysicalSizeSpec,
        transform: &ImageTransform,
    ) -> RgbaImage {
        let width = self.spec.pixels_for_cm(size.outer_diameter_cm);
        let geometry = self.geometry(size);
        let ratio = width as f64 / self.spec.preview_side as f64;
        let placement = geometry.place(source.width(), source.height(), transform, ratio);

        let mut canvas = RgbaImage::new(width, width);
        raster::draw_clipped(&mut canvas, source, &geometry, &placement);
        canvas
    }

    /// Build the print file for `order`.
    ///
    /// `Ok(None)` when the order carries no image; nothing is produced.
    pub fn export(&self, order: &Order) -> Result<Option<PrintFile>, ExportError> {
        let Some(image_data) = order.image_data() else {
            tracing::debug!(id = %order.id, "order has no image, skipping export");
            return Ok(None);
        };
        let size = order.size_details().ok_or(ExportError::MissingSize(order.id))?;

        let bytes = image_data.decode()?;
        let source = image::load_from_memory(&bytes)
            .map_err(ExportError::Decode)?
            .to_rgba8();

        let transform = order.image_transform();
        let canvas = self.compose(&source, size, transform);
        let (width, height) = canvas.dimensions();

        let mut encoded = Cursor::new(Vec::new());
        canvas
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(ExportError::Encode)?;
        let bytes = phys::inject(encoded.get_ref(), &PhysChunk::for_dpi(self.spec.dpi))?;

        let payload = JobPayload {
            dpi: self.spec.dpi,
            preview_side: self.spec.preview_side,
            transform,
            size,
            product_type: order.product_type(),
            quantity: order.quantity(),
            name: order.name(),
        };
        let job_hash = compute_job_hash(&order.id.to_string(), &size.id, &payload, ENGINE_VERSION)?;

        let file = PrintFile {
            order_id: order.id,
            filename: print_filename(
                order.product_type(),
                order.name(),
                order.quantity(),
                size.outer_diameter_cm,
            ),
            width,
            height,
            dpi: self.spec.dpi,
            sha256: sha256_hex(&bytes),
            bytes,
            job_hash,
        };
        tracing::info!(
            id = %order.id,
            file = %file.filename,
            width,
            bytes = file.bytes.len(),
            "print file rendered"
        );
        Ok(Some(file))
    }

    /// Export and hand the result to `sink`. `Ok(None)` when there was
    /// nothing to export.
    pub fn export_to(
        &self,
        order: &Order,
        sink: &mut dyn DownloadSink,
    ) -> Result<Option<PathBuf>, ExportError> {
        match self.export(order)? {
            Some(file) => sink.deliver(file).map(Some),
            None => Ok(None),
        }
    }
}

impl Default for PrintExporter {
    fn default() -> Self {
        Self::new(PrintSpec::default())
    }
}

/// Host side of the download: receives the bytes and the filename.
pub trait DownloadSink {
    fn deliver(&mut self, file: PrintFile) -> Result<PathBuf, ExportError>;
}

/// Saves print files into a directory. Same name overwrites.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&mut self, file: PrintFile) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&file.filename);
        fs::write(&path, &file.bytes)?;
        tracing::info!(path = %path.display(), "print file saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_format() {
        assert_eq!(
            print_filename(ProductType::Pin, "Ryan Nugraha!!", 3, 5.5),
            "PIN_RYAN_NUGRAHA___QTY3_SIZE5.5CM.png"
        );
        assert_eq!(
            print_filename(ProductType::Keychain, "siti-a_b", 10, 6.95),
            "GANCI_SITI-A_B_QTY10_SIZE6.95CM.png"
        );
        assert_eq!(print_filename(ProductType::Pin, "x", 1, 5.0), "PIN_X_QTY1_SIZE5CM.png");
    }

    #[test]
    fn test_sanitize_non_ascii() {
        assert_eq!(sanitize_name("Dédé 2"), "D_D__2");
        assert_eq!(sanitize_name(""), "");
    }
}
