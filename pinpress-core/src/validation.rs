//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured violations.
//! The validator decides whether a draft may enter the store.

use serde::{Deserialize, Serialize};

use crate::order::OrderDraft;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, draft: &OrderDraft) -> Vec<ValidationViolation>;
}

fn error(rule: &str, message: &str, expected: Option<String>, actual: Option<String>, fix: &str) -> ValidationViolation {
    ValidationViolation {
        rule: rule.to_string(),
        severity: ViolationSeverity::Error,
        message: message.to_string(),
        expected,
        actual,
        remediation: vec![fix.to_string()],
    }
}

// --- Concrete Rules ---

pub struct NameRule;

impl ValidationRule for NameRule {
    fn name(&self) -> &'static str { "name" }

    fn validate(&self, draft: &OrderDraft) -> Vec<ValidationViolation> {
        if draft.name.trim().is_empty() {
            vec![error(self.name(), "Orderer name is empty", None, None, "Fill in the orderer name")]
        } else {
            vec![]
        }
    }
}

pub struct QuantityRule;

impl ValidationRule for QuantityRule {
    fn name(&self) -> &'static str { "quantity" }

    fn validate(&self, draft: &OrderDraft) -> Vec<ValidationViolation> {
        if draft.quantity < 1 {
            vec![error(
                self.name(),
                "Quantity must be at least 1",
                Some(">= 1".to_string()),
                Some(draft.quantity.to_string()),
                "Order one piece or more",
            )]
        } else {
            vec![]
        }
    }
}

pub struct ImageRule;

impl ValidationRule for ImageRule {
    fn name(&self) -> &'static str { "image" }

    fn validate(&self, draft: &OrderDraft) -> Vec<ValidationViolation> {
        match &draft.image_data {
            Some(data) if !data.is_empty() => vec![],
            _ => vec![error(self.name(), "No image uploaded", None, None, "Upload an image first")],
        }
    }
}

/// The contact number is collected but not required.
pub struct PhoneRule;

impl ValidationRule for PhoneRule {
    fn name(&self) -> &'static str { "phone" }

    fn validate(&self, draft: &OrderDraft) -> Vec<ValidationViolation> {
        if draft.phone_number.trim().is_empty() {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: "No phone number to contact the orderer".to_string(),
                expected: None,
                actual: None,
                remediation: vec!["Add a WhatsApp or phone number".to_string()],
            }]
        } else {
            vec![]
        }
    }
}

pub struct SizeRule;

impl ValidationRule for SizeRule {
    fn name(&self) -> &'static str { "size" }

    fn validate(&self, draft: &OrderDraft) -> Vec<ValidationViolation> {
        match &draft.size_details {
            None => vec![error(
                self.name(),
                "Unknown size",
                Some("a catalog size".to_string()),
                Some(draft.size.clone()),
                "Pick one of the listed sizes",
            )],
            Some(spec) if spec.check().is_err() => vec![error(
                self.name(),
                "Inner diameter must be smaller than outer diameter",
                Some(format!("< {}cm", spec.outer_diameter_cm)),
                Some(format!("{}cm", spec.inner_diameter_cm)),
                "Fix the size catalog entry",
            )],
            Some(_) => vec![],
        }
    }
}

/// Validator runs every rule; any error rejects the draft
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(NameRule),
                Box::new(PhoneRule),
                Box::new(QuantityRule),
                Box::new(ImageRule),
                Box::new(SizeRule),
            ],
        }
    }

    pub fn validate(&self, draft: &OrderDraft) -> ValidationResult {
        let mut result = ValidationResult {
            valid: true,
            violations: self.rules.iter().flat_map(|rule| rule.validate(draft)).collect(),
        };
        result.valid = !result.has_errors();
        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::geometry::ImageTransform;
    use crate::order::{ImageData, OrderForm};

    fn draft(name: &str, size: &str, quantity: u32, image: bool) -> OrderDraft {
        let form = OrderForm {
            name: name.to_string(),
            phone_number: "0812".to_string(),
            size: size.to_string(),
            quantity,
            ..Default::default()
        };
        let image = image.then(|| ImageData::from_jpeg(&[1, 2, 3]));
        OrderDraft::from_form(form, &Catalog::builtin(), image, ImageTransform::identity())
    }

    #[test]
    fn test_valid_draft() {
        let result = Validator::new().validate(&draft("Sari", "small", 2, true));
        assert!(result.valid);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_collects_every_violation() {
        let result = Validator::new().validate(&draft("  ", "jumbo", 0, false));
        assert!(!result.valid);
        let rules: Vec<_> = result.violations.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["name", "quantity", "image", "size"]);
        assert!(result.has_errors());
        assert!(result.summary().contains("quantity: Quantity must be at least 1"));
    }

    #[test]
    fn test_missing_phone_only_warns() {
        let mut d = draft("Sari", "small", 1, true);
        d.phone_number = " ".to_string();
        let result = Validator::new().validate(&d);
        assert!(result.valid);
        assert!(!result.has_errors());
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].rule, "phone");
        assert_eq!(result.violations[0].severity, ViolationSeverity::Warning);
    }
}
