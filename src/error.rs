// src/error.rs - Error types for the API service and the sync client
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==================== SERVER SIDE ====================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(String),
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body of every non-2xx response. Clients display `detail` verbatim.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ApiError {
    /// Human-readable message without the category prefix.
    pub fn detail(&self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ValidationError(msg) => msg.clone(),
            ApiError::DatabaseError(_) => "Database error".to_string(),
        }
    }

    pub fn medicine_not_found() -> Self {
        ApiError::NotFound("Medicine not found".to_string())
    }

    pub fn medicine_already_exists() -> Self {
        ApiError::BadRequest("Medicine with this ID already exists".to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        if let ApiError::DatabaseError(err) = self {
            log::error!("Database error: {}", err);
        }

        let error_response = ErrorResponse {
            detail: self.detail(),
        };

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::DatabaseError(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

// ==================== CLIENT SIDE ====================

/// Failures surfaced by the sync controller to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    /// No response was obtained (unreachable host, timeout, broken connection).
    Connectivity(String),
    /// Input rejected locally; no request was sent.
    Validation(String),
    /// The server refused a create, usually a duplicate id. Carries the server's `detail`.
    Conflict(String),
    /// The server reported the id absent.
    NotFound(String),
    /// Any other non-2xx status, or a body that could not be decoded.
    Server { status: u16, message: String },
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SyncError::Connectivity(_))
    }

    /// Message suitable for showing to the user as-is.
    pub fn message(&self) -> &str {
        match self {
            SyncError::Connectivity(msg)
            | SyncError::Validation(msg)
            | SyncError::Conflict(msg)
            | SyncError::NotFound(msg) => msg,
            SyncError::Server { message, .. } => message,
        }
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::Connectivity(msg) => write!(f, "Backend not reachable: {}", msg),
            SyncError::Validation(msg) => write!(f, "Validation Error: {}", msg),
            SyncError::Conflict(msg) => write!(f, "{}", msg),
            SyncError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            SyncError::Server { status, message } => write!(f, "Server Error ({}): {}", status, message),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Server {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("Invalid response body: {}", err),
            }
        } else {
            SyncError::Connectivity(err.to_string())
        }
    }
}
