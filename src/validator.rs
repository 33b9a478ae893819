// src/validator.rs - Raw form input parsing and validation
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::error::SyncError;
use crate::models::NewMedicine;

// ==================== VALIDATION RESULT ====================

#[derive(Debug, Default, Serialize)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add_error(field, message);
        }
    }

    pub fn to_sync_error(&self) -> SyncError {
        let message = self.errors
            .iter()
            .map(|(field, errors)| format!("{}: {}", field, errors.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        SyncError::Validation(message)
    }
}

// ==================== FIELD VALIDATORS ====================

pub struct FieldValidator;

impl FieldValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{} is required", field))
        } else {
            Ok(())
        }
    }

    pub fn integer(value: &str, field: &str) -> Result<i64, String> {
        let value = value.trim();
        Self::not_empty(value, field)?;
        value
            .parse::<i64>()
            .map_err(|_| format!("{} must be a whole number", field))
    }

    pub fn number(value: &str, field: &str) -> Result<f64, String> {
        let value = value.trim();
        Self::not_empty(value, field)?;
        match value.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(format!("{} must be a number", field)),
        }
    }

    pub fn non_negative<T: PartialOrd + Default + std::fmt::Display>(value: T, field: &str) -> Result<(), String> {
        if value < T::default() {
            Err(format!("{} cannot be negative", field))
        } else {
            Ok(())
        }
    }

    /// Quantity as typed into an editable cell.
    pub fn quantity(value: &str) -> Result<i64, String> {
        let quantity = Self::integer(value, "quantity")?;
        Self::non_negative(quantity, "quantity")?;
        Ok(quantity)
    }
}

// ==================== ADD FORM ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Id,
    Name,
    Quantity,
    Price,
}

/// The add-item form exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineForm {
    pub id: String,
    pub name: String,
    pub quantity: String,
    pub price: String,
}

impl MedicineForm {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity: quantity.into(),
            price: price.into(),
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Id => &mut self.id,
            FormField::Name => &mut self.name,
            FormField::Quantity => &mut self.quantity,
            FormField::Price => &mut self.price,
        };
        *slot = value.into();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Parses every field, collecting all problems before giving up.
    pub fn parse(&self) -> Result<NewMedicine, SyncError> {
        let mut result = ValidationResult::new();

        let id = FieldValidator::integer(&self.id, "id")
            .map_err(|e| result.add_error("id", e))
            .ok();
        result.check("name", FieldValidator::not_empty(&self.name, "name"));
        let quantity = FieldValidator::integer(&self.quantity, "quantity")
            .and_then(|q| FieldValidator::non_negative(q, "quantity").map(|_| q))
            .map_err(|e| result.add_error("quantity", e))
            .ok();
        let price = FieldValidator::number(&self.price, "price")
            .and_then(|p| FieldValidator::non_negative(p, "price").map(|_| p))
            .map_err(|e| result.add_error("price", e))
            .ok();

        let (Some(id), Some(quantity), Some(price), true) = (id, quantity, price, result.is_valid()) else {
            return Err(result.to_sync_error());
        };

        let candidate = NewMedicine {
            id,
            name: self.name.trim().to_string(),
            quantity,
            price,
        };
        candidate
            .validate()
            .map_err(|e| SyncError::Validation(e.to_string()))?;

        Ok(candidate)
    }
}

// ==================== QUANTITY CELL ====================

/// An editable quantity cell. Edits are committed on blur, never per keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityEdit {
    pub id: i64,
    rendered: i64,
    draft: String,
}

impl QuantityEdit {
    pub fn new(id: i64, rendered: i64) -> Self {
        Self {
            id,
            rendered,
            draft: rendered.to_string(),
        }
    }

    pub fn input(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.trim() != self.rendered.to_string()
    }

    /// Called on blur. Yields the text to send, or `None` when nothing changed.
    pub fn commit(&self) -> Option<&str> {
        self.is_dirty().then_some(self.draft.as_str())
    }
}
