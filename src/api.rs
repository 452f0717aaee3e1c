//! HTTP surface: `GET /quote`

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::core::error::QuoteError;
use crate::core::quotation::Quotation;
use crate::providers::caching::CachingQuoteProvider;

pub struct AppState {
    pub quotes: CachingQuoteProvider,
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

pub struct ApiError(QuoteError);

impl From<QuoteError> for ApiError {
    fn from(err: QuoteError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            kind: self.0.kind(),
            message: self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

async fn get_quote(State(state): State<Arc<AppState>>) -> ApiResult<Json<Quotation>> {
    match state.quotes.quotation_at(Local::now()).await {
        Ok(quotation) => {
            info!(
                id = %quotation.id,
                value = quotation.value,
                timestamp = quotation.timestamp,
                "Served quotation"
            );
            Ok(Json(quotation))
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "Failed to serve quotation");
            Err(e.into())
        }
    }
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/quote", get(get_quote))
        .with_state(state)
}
