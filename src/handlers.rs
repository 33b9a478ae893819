// src/handlers.rs - HTTP handlers for /medicines
use actix_web::{error::InternalError, web, HttpResponse};
use std::sync::Arc;
use validator::Validate;
use log::info;
use crate::AppState;
use crate::error::{ApiError, ApiResult, ErrorResponse};
use crate::models::{MessageResponse, NewMedicine, QuantityQuery, SearchQuery};
use crate::repositories::MedicineRepository;

// ==================== MEDICINE HANDLERS ====================

/// GET /medicines - always a bare JSON array, narrowed by `?search=`
pub async fn get_medicines(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let medicines = MedicineRepository::list(&app_state.db_pool, query.term()).await?;
    Ok(HttpResponse::Ok().json(medicines))
}

/// POST /medicines
pub async fn add_medicine(
    app_state: web::Data<Arc<AppState>>,
    medicine: web::Json<NewMedicine>,
) -> ApiResult<HttpResponse> {
    medicine.validate()?;

    let created = MedicineRepository::create(&app_state.db_pool, &medicine).await?;
    info!("Medicine created: {} ({})", created.name, created.id);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Medicine added successfully")))
}

/// DELETE /medicines/{id}
pub async fn delete_medicine(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    MedicineRepository::delete(&app_state.db_pool, id).await?;
    info!("Medicine deleted: {}", id);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Medicine deleted successfully")))
}

/// PUT /medicines/{id}?quantity=N
pub async fn update_quantity(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    query: web::Query<QuantityQuery>,
) -> ApiResult<HttpResponse> {
    query.validate()?;

    let id = path.into_inner();
    MedicineRepository::update_quantity(&app_state.db_pool, id, query.quantity).await?;
    info!("Medicine {} quantity set to {}", id, query.quantity);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Quantity updated successfully")))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

// ==================== ROUTING ====================

/// Malformed paths, queries and bodies answer with the same `{detail}` shape as other errors.
fn extractor_error(err: impl std::fmt::Display) -> actix_web::Error {
    let detail = err.to_string();
    let response = HttpResponse::UnprocessableEntity().json(ErrorResponse { detail: detail.clone() });
    InternalError::from_response(ApiError::ValidationError(detail), response).into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::JsonConfig::default().error_handler(|err, _| extractor_error(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| extractor_error(err)))
        .route("/health", web::get().to(health))
        .service(
            web::resource("/medicines")
                .route(web::get().to(get_medicines))
                .route(web::post().to(add_medicine)),
        )
        .service(
            web::resource("/medicines/{id}")
                .route(web::delete().to(delete_medicine))
                .route(web::put().to(update_quantity)),
        );
}
