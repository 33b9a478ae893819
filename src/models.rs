// src/models.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Items with fewer units than this are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 45;

// ==================== MEDICINE ====================

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

impl Medicine {
    pub fn status(&self) -> StockStatus {
        StockStatus::for_quantity(self.quantity)
    }

    pub fn is_low_stock(&self) -> bool {
        self.status() == StockStatus::LowStock
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockStatus {
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "In Stock")]
    InStock,
}

impl StockStatus {
    pub fn for_quantity(quantity: i64) -> Self {
        if quantity < LOW_STOCK_THRESHOLD {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::LowStock => "Low Stock",
            StockStatus::InStock => "In Stock",
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a renderer needs for one table row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MedicineRow {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub status: StockStatus,
    pub low_stock: bool,
}

impl From<Medicine> for MedicineRow {
    fn from(medicine: Medicine) -> Self {
        let status = medicine.status();
        Self {
            medicine,
            status,
            low_stock: status == StockStatus::LowStock,
        }
    }
}

// ==================== REQUESTS ====================

/// Create payload. Shared by the client (after form parsing) and the server.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct NewMedicine {
    pub id: i64,

    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,

    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    pub quantity: i64,

    #[validate(range(min = 0.0, message = "Price must be non-negative"))]
    pub price: f64,
}

impl From<NewMedicine> for Medicine {
    fn from(m: NewMedicine) -> Self {
        Self {
            id: m.id,
            name: m.name,
            quantity: m.quantity,
            price: m.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct QuantityQuery {
    #[validate(range(min = 0, message = "Quantity must be non-negative"))]
    pub quantity: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    /// Trimmed search term, `None` when absent or blank.
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(quantity: i64) -> Medicine {
        Medicine {
            id: 1,
            name: "Paracetamol".to_string(),
            quantity,
            price: 20.0,
        }
    }

    #[test]
    fn test_status_threshold_boundary() {
        assert_eq!(medicine(45).status(), StockStatus::InStock);
        assert_eq!(medicine(44).status(), StockStatus::LowStock);
        assert_eq!(medicine(0).status(), StockStatus::LowStock);
        assert_eq!(medicine(1000).status().label(), "In Stock");
        assert_eq!(medicine(10).status().to_string(), "Low Stock");
    }

    #[test]
    fn test_row_flags_low_stock() {
        let row = MedicineRow::from(medicine(3));
        assert!(row.low_stock);
        assert_eq!(row.status, StockStatus::LowStock);

        let json = serde_json::to_value(MedicineRow::from(medicine(50))).unwrap();
        assert_eq!(json["status"], "In Stock");
        assert_eq!(json["low_stock"], false);
        assert_eq!(json["name"], "Paracetamol");
    }

    #[test]
    fn test_new_medicine_validation() {
        let mut m = NewMedicine {
            id: 1,
            name: "Paracetamol".to_string(),
            quantity: 100,
            price: 20.0,
        };
        assert!(m.validate().is_ok());

        m.quantity = -1;
        assert!(m.validate().is_err());

        m.quantity = 1;
        m.price = -0.5;
        assert!(m.validate().is_err());

        m.price = 0.0;
        m.name = String::new();
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_search_term() {
        assert_eq!(SearchQuery::default().term(), None);
        assert_eq!(SearchQuery { search: Some("  ".into()) }.term(), None);
        assert_eq!(SearchQuery { search: Some(" para ".into()) }.term(), Some("para"));
    }

    #[test]
    fn test_item_json_shape() {
        let m: Medicine =
            serde_json::from_str(r#"{"id": 7, "name": "Ibuprofen", "quantity": 12, "price": 3.5}"#).unwrap();
        assert_eq!(m.id, 7);
        assert!(m.is_low_stock());
    }
}
