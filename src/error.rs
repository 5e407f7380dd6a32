use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::{ApiResponse, Meta};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Carrier authentication failed: {0}")]
    Authentication(String),

    #[error("Carrier order import rejected (status {status})")]
    CarrierImport { status: u16, body: String },

    #[error("Carrier label request rejected (status {status})")]
    CarrierLabel { status: u16, body: String },

    #[error("Carrier call to {0} timed out")]
    CarrierTimeout(String),

    #[error("Label generation failed: {0}")]
    LabelGeneration(String),

    #[error("Persistence failed after label issuance: {0}")]
    Persistence(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Classify an outbound HTTP failure from the named carrier.
    pub fn from_outbound(carrier: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::CarrierTimeout(carrier.to_string())
        } else {
            AppError::Internal(anyhow::anyhow!("{carrier} request failed: {err}"))
        }
    }

    /// Raw carrier response body, when the failure carried one.
    fn details(&self) -> Option<String> {
        match self {
            AppError::CarrierImport { body, .. } | AppError::CarrierLabel { body, .. } => {
                Some(body.clone())
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_)
            | AppError::CarrierImport { .. }
            | AppError::CarrierLabel { .. }
            | AppError::CarrierTimeout(_)
            | AppError::LabelGeneration(_)
            | AppError::Persistence(_)
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ApiResponse {
            message: self.to_string(),
            data: Some(ErrorData {
                error: self.to_string(),
                details: self.details(),
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
