//! Courier endpoints.

use std::sync::Arc;

use application::{AddStoragePlace, CourierView, CreateCourier, GeoClient};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CourierId, StoragePlaceId};
use persistence::UnitOfWork;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateCourierRequest {
    pub name: String,
    pub speed: i32,
}

#[derive(Deserialize)]
pub struct AddStoragePlaceRequest {
    pub name: String,
    pub total_volume: i32,
}

#[derive(Serialize)]
pub struct CourierCreatedResponse {
    pub courier_id: CourierId,
}

#[derive(Serialize)]
pub struct StoragePlaceAddedResponse {
    pub courier_id: CourierId,
    pub storage_place_id: StoragePlaceId,
}

/// POST /couriers: register a courier with the default storage place.
#[tracing::instrument(skip(state, req))]
pub async fn create<U: UnitOfWork + 'static, G: GeoClient + 'static>(
    State(state): State<Arc<AppState<U, G>>>,
    Json(req): Json<CreateCourierRequest>,
) -> Result<(StatusCode, Json<CourierCreatedResponse>), ApiError> {
    let courier_id = state
        .service
        .create_courier(CreateCourier::new(req.name, req.speed))
        .await?;
    Ok((StatusCode::CREATED, Json(CourierCreatedResponse { courier_id })))
}

/// GET /couriers: every courier with its storage places.
#[tracing::instrument(skip(state))]
pub async fn list<U: UnitOfWork + 'static, G: GeoClient + 'static>(
    State(state): State<Arc<AppState<U, G>>>,
) -> Result<Json<Vec<CourierView>>, ApiError> {
    Ok(Json(state.service.get_all_couriers().await?))
}

/// POST /couriers/{id}/storage-places: add a storage place to a courier.
#[tracing::instrument(skip(state, req))]
pub async fn add_storage_place<U: UnitOfWork + 'static, G: GeoClient + 'static>(
    State(state): State<Arc<AppState<U, G>>>,
    Path(id): Path<String>,
    Json(req): Json<AddStoragePlaceRequest>,
) -> Result<(StatusCode, Json<StoragePlaceAddedResponse>), ApiError> {
    let courier_id: CourierId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid courier id: {e}")))?;
    let place_id = state
        .service
        .add_storage_place(AddStoragePlace::new(courier_id, req.name, req.total_volume))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(StoragePlaceAddedResponse {
            courier_id,
            storage_place_id: place_id,
        }),
    ))
}
