mod analysis;
mod hotels;
mod reviews;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use hotelcheck_analysis::{AnalysisError, Analyzer, OpenAiEmbeddingClient};
use hotelcheck_core::{Catalog, Hotel};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer<OpenAiEmbeddingClient>>,
    pub catalog: Arc<Catalog>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "analysis_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Look up a hotel or produce the `not_found` error for it.
pub(super) fn find_hotel<'a>(
    catalog: &'a Catalog,
    hotel_id: &str,
    request_id: &str,
) -> Result<&'a Hotel, ApiError> {
    catalog.hotel(hotel_id).ok_or_else(|| {
        ApiError::new(
            request_id,
            "not_found",
            format!("hotel {hotel_id} not found"),
        )
    })
}

pub(super) fn map_analysis_error(request_id: String, error: &AnalysisError) -> ApiError {
    match error {
        AnalysisError::EmptyText => {
            ApiError::new(request_id, "validation_error", "review_text must not be empty")
        }
        AnalysisError::AnalysisUnavailable { .. }
        | AnalysisError::EmbeddingUnavailable(_)
        | AnalysisError::Configuration(_) => {
            tracing::warn!(error = %error, "analysis unavailable");
            ApiError::new(request_id, "analysis_unavailable", error.to_string())
        }
        AnalysisError::DimensionMismatch { .. } | AnalysisError::DegenerateVector => {
            tracing::error!(error = %error, "embeddings cannot be compared");
            ApiError::new(request_id, "internal_error", "embeddings cannot be compared")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/hotels", get(hotels::list_hotels))
        .route(
            "/api/v1/hotels/{hotel_id}/analysis",
            get(analysis::analyze_hotel),
        )
        .route("/api/v1/reviews/analyze", post(reviews::analyze_review))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData { status: "ok" },
        meta: ResponseMeta::new(req_id.0),
    })
}
