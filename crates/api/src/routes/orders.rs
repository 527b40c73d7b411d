//! Order endpoints.

use std::sync::Arc;

use application::{CreateOrder, GeoClient, OrderView};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::OrderId;
use persistence::UnitOfWork;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    /// Client-chosen id; generated when absent.
    pub order_id: Option<String>,
    pub street: String,
    pub volume: i32,
}

#[derive(Serialize)]
pub struct OrderCreatedResponse {
    pub order_id: OrderId,
}

/// POST /orders: create an order for a street address.
#[tracing::instrument(skip(state, req))]
pub async fn create<U: UnitOfWork + 'static, G: GeoClient + 'static>(
    State(state): State<Arc<AppState<U, G>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>), ApiError> {
    let order_id = match req.order_id.as_deref() {
        Some(id) => id
            .parse()
            .map_err(|e| ApiError::BadRequest(format!("Invalid order_id: {e}")))?,
        None => OrderId::new(),
    };

    let order_id = state
        .service
        .create_order(CreateOrder::new(order_id, req.street, req.volume))
        .await?;
    Ok((StatusCode::CREATED, Json(OrderCreatedResponse { order_id })))
}

/// GET /orders: orders not yet delivered.
#[tracing::instrument(skip(state))]
pub async fn list<U: UnitOfWork + 'static, G: GeoClient + 'static>(
    State(state): State<Arc<AppState<U, G>>>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.service.get_uncompleted_orders().await?))
}
