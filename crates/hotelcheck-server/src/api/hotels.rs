use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct HotelItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub features: Vec<String>,
    pub review_count: usize,
}

pub(super) async fn list_hotels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<HotelItem>>> {
    let data = state
        .catalog
        .hotels()
        .iter()
        .map(|hotel| HotelItem {
            id: hotel.id.clone(),
            name: hotel.name.clone(),
            description: hotel.description.clone(),
            features: hotel.features.clone(),
            review_count: state.catalog.reviews_for(&hotel.id).len(),
        })
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
