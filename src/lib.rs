// src/lib.rs
//! Medicine inventory.
//!
//! The [`sync`] module holds the client-side controller that keeps a local list
//! of medicines in step with the HTTP API; the remaining modules implement that
//! API on top of SQLite.

use sqlx::SqlitePool;

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod sync;
pub mod validator;

pub use client::{HttpMedicineApi, MedicineApi};
pub use error::{ApiError, SyncError};
pub use models::{Medicine, MedicineRow, StockStatus, LOW_STOCK_THRESHOLD};
pub use sync::{InventorySyncController, RefreshOutcome};
pub use validator::{FormField, MedicineForm, QuantityEdit};

pub struct AppState {
    pub db_pool: SqlitePool,
}
