use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use hotelcheck_analysis::CustomReviewAnalysis;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{find_hotel, map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};

/// Missing fields deserialize as empty so they get the same
/// `validation_error` as blank ones.
#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeReviewRequest {
    #[serde(default)]
    pub hotel_id: String,
    #[serde(default)]
    pub review_text: String,
}

pub(super) async fn analyze_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalyzeReviewRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CustomReviewAnalysis>>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected review analysis body");
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;
    let hotel_id = body.hotel_id.trim();
    if hotel_id.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "hotel_id must not be empty",
        ));
    }
    if body.review_text.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "review_text must not be empty",
        ));
    }

    let hotel = find_hotel(&state.catalog, hotel_id, &req_id.0)?;
    let analysis = state
        .analyzer
        .analyze_custom_review(hotel, &body.review_text)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: analysis,
        meta: ResponseMeta::new(req_id.0),
    }))
}
