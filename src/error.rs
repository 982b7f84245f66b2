use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid point: {0}")]
    InvalidPoint(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient candidate waypoints: generated {generated}, need at least {required}")]
    InsufficientCandidates { generated: usize, required: usize },

    #[error("No viable route variant: {0}")]
    NoViableVariant(String),

    #[error("Routing engine error: {0}")]
    Routing(String),

    #[error("Routing engine unavailable after {attempts} attempts")]
    RoutingUnavailable { attempts: usize },

    #[error("Place search error: {0}")]
    Search(String),

    #[error("Geocoding error: {0}")]
    Geocoding(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Route generation cancelled")]
    Cancelled,

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPoint(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientCandidates { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NoViableVariant(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Routing(_) | AppError::Search(_) | AppError::Geocoding(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::RoutingUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Cancelled => StatusCode::REQUEST_TIMEOUT,
            AppError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::InvalidPoint(ref e) | AppError::InvalidRequest(ref e) => e.clone(),
            AppError::InsufficientCandidates { .. } => {
                tracing::warn!("{}", self);
                self.to_string()
            }
            AppError::NoViableVariant(ref e) => {
                tracing::info!("No viable variant: {}", e);
                "No POIs could be incorporated into the route".to_string()
            }
            AppError::Routing(ref e) => {
                tracing::error!("Routing engine error: {}", e);
                "Routing service error".to_string()
            }
            AppError::RoutingUnavailable { attempts } => {
                tracing::error!(attempts, "Routing engine unavailable");
                "Routing service unavailable".to_string()
            }
            AppError::Search(ref e) => {
                tracing::warn!("Place search error: {}", e);
                "Place search service error".to_string()
            }
            AppError::Geocoding(ref e) => {
                tracing::warn!("Geocoding error: {}", e);
                "Geocoding service error".to_string()
            }
            AppError::Cache(ref e) => {
                tracing::warn!("Cache error: {}", e);
                "Cache error".to_string()
            }
            AppError::Cancelled => "Route generation was cancelled".to_string(),
            AppError::NotFound(ref e) => e.clone(),
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
