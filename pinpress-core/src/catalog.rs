//! Size Catalog - Static Physical Specifications
//!
//! Loaded once, never mutated after startup. Orders snapshot the entry they
//! were placed with, so catalog edits never reach past orders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub type SizeId = String;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Size {id}: inner diameter {inner}cm must be positive and smaller than outer diameter {outer}cm")]
    InvalidDiameters { id: String, inner: f64, outer: f64 },

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog entry {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalSizeSpec {
    pub id: SizeId,
    pub label: String,
    /// Cut line diameter.
    pub outer_diameter_cm: f64,
    /// Visible face diameter.
    pub inner_diameter_cm: f64,
    #[serde(default)]
    pub original_price: Option<u64>,
    pub price: u64,
    #[serde(default)]
    pub description: String,
}

impl PhysicalSizeSpec {
    pub fn face_ratio(&self) -> f64 {
        self.inner_diameter_cm / self.outer_diameter_cm
    }

    pub fn check(&self) -> Result<(), CatalogError> {
        let valid = self.inner_diameter_cm > 0.0
            && self.outer_diameter_cm.is_finite()
            && self.inner_diameter_cm < self.outer_diameter_cm;
        if valid {
            Ok(())
        } else {
            Err(CatalogError::InvalidDiameters {
                id: self.id.clone(),
                inner: self.inner_diameter_cm,
                outer: self.outer_diameter_cm,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Pin,
    Keychain,
}

impl ProductType {
    /// Code used in print filenames.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pin => "PIN",
            Self::Keychain => "GANCI",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pin => "Pin Peniti",
            Self::Keychain => "Gantungan Kunci",
        }
    }
}

/// Catalog - maps size ids to physical specs
#[derive(Debug, Clone)]
pub struct Catalog {
    sizes: HashMap<SizeId, PhysicalSizeSpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self { sizes: HashMap::new() }
    }

    /// The two sizes the shop ships with.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.sizes.insert(
            "small".to_string(),
            PhysicalSizeSpec {
                id: "small".to_string(),
                label: "Kecil".to_string(),
                outer_diameter_cm: 5.5,
                inner_diameter_cm: 4.4,
                original_price: Some(6000),
                price: 5000,
                description: "Pin ukuran standar (5.5cm)".to_string(),
            },
        );
        catalog.sizes.insert(
            "large".to_string(),
            PhysicalSizeSpec {
                id: "large".to_string(),
                label: "Besar".to_string(),
                outer_diameter_cm: 6.95,
                inner_diameter_cm: 5.8,
                original_price: Some(9000),
                price: 8000,
                description: "Pin ukuran besar (6.95cm)".to_string(),
            },
        );
        catalog
    }

    /// Load every `*.json` file in `dir` as one size entry.
    ///
    /// A missing directory falls back to the builtin catalog.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        if !dir.exists() {
            tracing::debug!(dir = %dir.display(), "catalog dir absent, using builtin sizes");
            return Ok(Self::builtin());
        }

        let mut catalog = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().map_or(false, |e| e == "json") {
                let content = fs::read_to_string(&path)?;
                let spec: PhysicalSizeSpec =
                    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                        path: path.display().to_string(),
                        source,
                    })?;
                catalog.register(spec)?;
            }
        }
        tracing::debug!(sizes = catalog.sizes.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&PhysicalSizeSpec> {
        self.sizes.get(id)
    }

    pub fn list(&self) -> Vec<&PhysicalSizeSpec> {
        let mut sizes: Vec<_> = self.sizes.values().collect();
        sizes.sort_by(|a, b| a.id.cmp(&b.id));
        sizes
    }

    pub fn register(&mut self, spec: PhysicalSizeSpec) -> Result<(), CatalogError> {
        spec.check()?;
        self.sizes.insert(spec.id.clone(), spec);
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sizes() {
        let catalog = Catalog::builtin();
        let small = catalog.get("small").unwrap();
        assert_eq!(small.outer_diameter_cm, 5.5);
        assert!((small.face_ratio() - 0.8).abs() < 1e-12);
        assert_eq!(catalog.list().len(), 2);
        assert!(catalog.get("medium").is_none());
    }

    #[test]
    fn test_register_rejects_inverted_diameters() {
        let mut catalog = Catalog::new();
        let spec = PhysicalSizeSpec {
            id: "bad".to_string(),
            label: "Bad".to_string(),
            outer_diameter_cm: 4.0,
            inner_diameter_cm: 4.0,
            original_price: None,
            price: 1,
            description: String::new(),
        };
        assert!(matches!(
            catalog.register(spec),
            Err(CatalogError::InvalidDiameters { .. })
        ));
    }

    #[test]
    fn test_product_codes() {
        assert_eq!(ProductType::Pin.code(), "PIN");
        assert_eq!(ProductType::Keychain.code(), "GANCI");
        assert_eq!(ProductType::default(), ProductType::Pin);
    }

    #[test]
    fn test_spec_uses_camel_case() {
        let json = r#"{"id":"x","label":"X","outerDiameterCm":3.2,"innerDiameterCm":2.5,"price":100}"#;
        let spec: PhysicalSizeSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.inner_diameter_cm, 2.5);
        assert_eq!(spec.original_price, None);
    }
}
