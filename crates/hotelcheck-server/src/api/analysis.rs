use axum::{
    extract::{Path, State},
    Extension, Json,
};
use hotelcheck_analysis::AnalysisResult;
use hotelcheck_core::Hotel;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{find_hotel, map_analysis_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct HotelAnalysisData {
    pub hotel: Hotel,
    pub parameter_text: String,
    pub threshold: f32,
    pub flagged_count: usize,
    pub failed_count: usize,
    pub seeded_anomalous_count: usize,
    pub results: Vec<AnalysisResult>,
}

pub(super) async fn analyze_hotel(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(hotel_id): Path<String>,
) -> Result<Json<ApiResponse<HotelAnalysisData>>, ApiError> {
    let hotel = find_hotel(&state.catalog, &hotel_id, &req_id.0)?;
    let reviews = state.catalog.reviews_for(&hotel.id);

    let analysis = state
        .analyzer
        .analyze_hotel(hotel, &reviews)
        .await
        .map_err(|e| map_analysis_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: HotelAnalysisData {
            hotel: hotel.clone(),
            flagged_count: analysis.flagged_count(),
            failed_count: analysis.failed_count(),
            seeded_anomalous_count: analysis.seeded_anomalous_count(),
            parameter_text: analysis.parameter_text,
            threshold: analysis.threshold,
            results: analysis.results,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
