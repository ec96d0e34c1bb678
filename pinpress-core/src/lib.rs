//! Pinpress Core - Pin Mockup And Print Engine
//!
//! # Guarantees
//! 1. One geometry model serves preview and print
//! 2. The transform is owned by the mockup while editing, copied on submit
//! 3. Orders keep the size spec they were placed with
//! 4. Print files are deterministic and carry their density
//! 5. Missing input aborts quietly or with an error, never a partial file

pub mod catalog;
pub mod geometry;
pub mod raster;
pub mod mockup;
pub mod phys;
pub mod print;
pub mod export;
pub mod order;
pub mod store;
pub mod validation;
pub mod compress;
pub mod report;
pub mod hashing;
pub mod config;
pub mod logging;

pub use catalog::{Catalog, CatalogError, PhysicalSizeSpec, ProductType, SizeId};
pub use geometry::{ImageTransform, PinGeometry, Placement, MAX_SCALE, MIN_SCALE, SCALE_STEP};
pub use mockup::{Caption, DecodeJob, DecodeOutcome, MockupRenderer, PreviewFrame};
pub use phys::{PhysChunk, PhysError};
pub use print::PrintSpec;
pub use export::{print_filename, sanitize_name, DirectorySink, DownloadSink, ExportError, PrintExporter, PrintFile};
pub use order::{ImageData, Order, OrderDraft, OrderForm, OrderStatus};
pub use store::{JsonOrderStore, OrderEvent, OrderFilter, OrderStore, StoreError};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
pub use hashing::{compute_job_hash, canonical_json, sha256_hex};
pub use config::{AppConfig, LoggingConfig};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
