use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::labels::{GenerateLabelRequest, LabelResponse},
    error::AppResult,
    models::ShippingLabel,
    response::ApiResponse,
    services::label_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_label))
        .route("/{order_id}", get(get_label))
}

#[utoipa::path(
    post,
    path = "/labels/generate",
    request_body = GenerateLabelRequest,
    responses(
        (status = 200, description = "Label generated or already present", body = ApiResponse<LabelResponse>),
        (status = 400, description = "Missing order_id"),
        (status = 404, description = "Order, listing or shipping option not found"),
        (status = 500, description = "Carrier or persistence failure"),
    ),
    tag = "Labels"
)]
pub async fn generate_label(
    State(state): State<AppState>,
    Json(payload): Json<GenerateLabelRequest>,
) -> AppResult<Json<ApiResponse<LabelResponse>>> {
    let response = label_service::generate_label(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/labels/{order_id}",
    responses(
        (status = 200, description = "Label for the order", body = ApiResponse<ShippingLabel>),
        (status = 404, description = "No label for this order"),
    ),
    tag = "Labels"
)]
pub async fn get_label(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShippingLabel>>> {
    let response = label_service::get_label(&state, order_id).await?;
    Ok(Json(response))
}
