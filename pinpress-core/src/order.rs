//! Orders - What The Storefront Hands To The Store
//!
//! The draft carries a frozen copy of the transform and of the size spec.
//! Export only ever reads those snapshots.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{Catalog, PhysicalSizeSpec, ProductType, SizeId};
use crate::geometry::ImageTransform;

#[derive(Debug, Error)]
pub enum ImageDataError {
    #[error("Image data is not a base64 data URI")]
    NotDataUri,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A compressed raster embedded as a `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self(format!("data:{mime};base64,{payload}"))
    }

    pub fn from_jpeg(bytes: &[u8]) -> Self {
        Self::from_bytes("image/jpeg", bytes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn mime(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, _) = rest.split_once(',')?;
        header.strip_suffix(";base64")
    }

    /// Raw image bytes behind the URI.
    pub fn decode(&self) -> Result<Vec<u8>, ImageDataError> {
        let rest = self.0.strip_prefix("data:").ok_or(ImageDataError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(ImageDataError::NotDataUri)?;
        if !header.ends_with(";base64") {
            return Err(ImageDataError::NotDataUri);
        }
        Ok(base64::engine::general_purpose::STANDARD.decode(payload.trim())?)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
}

/// Customer input from the order form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderForm {
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub product_type: ProductType,
    pub size: SizeId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub product_type: ProductType,
    pub size: SizeId,
    #[serde(default)]
    pub size_details: Option<PhysicalSizeSpec>,
    pub quantity: u32,
    #[serde(default)]
    pub image_data: Option<ImageData>,
    #[serde(default)]
    pub image_transform: ImageTransform,
}

impl OrderDraft {
    /// Freeze form input, the captured image and the transform into a draft.
    /// The size spec is copied out of the catalog here, once.
    pub fn from_form(
        form: OrderForm,
        catalog: &Catalog,
        image_data: Option<ImageData>,
        image_transform: ImageTransform,
    ) -> Self {
        let size_details = catalog.get(&form.size).cloned();
        Self {
            name: form.name,
            phone_number: form.phone_number,
            product_type: form.product_type,
            size: form.size,
            size_details,
            quantity: form.quantity,
            image_data,
            image_transform,
        }
    }

    /// Line total in rupiah; zero when the size snapshot is missing.
    pub fn total_price(&self) -> u64 {
        self.size_details
            .as_ref()
            .map_or(0, |s| s.price * self.quantity as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(flatten)]
    pub draft: OrderDraft,
}

impl Order {
    pub fn new(draft: OrderDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
            draft,
        }
    }

    pub fn name(&self) -> &str {
        &self.draft.name
    }

    pub fn quantity(&self) -> u32 {
        self.draft.quantity
    }

    pub fn product_type(&self) -> ProductType {
        self.draft.product_type
    }

    pub fn size_details(&self) -> Option<&PhysicalSizeSpec> {
        self.draft.size_details.as_ref()
    }

    pub fn image_data(&self) -> Option<&ImageData> {
        self.draft.image_data.as_ref().filter(|d| !d.is_empty())
    }

    pub fn image_transform(&self) -> &ImageTransform {
        &self.draft.image_transform
    }
}
