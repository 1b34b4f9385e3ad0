//! Errors surfaced at the HTTP boundary

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::types::ParseError;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("unknown product '{0}'")]
    UnknownProduct(String),

    #[error("no siv data for product group '{0}'")]
    NoData(String),

    #[error(transparent)]
    BadRequest(#[from] ParseError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error(transparent)]
    Data(#[from] anyhow::Error),
}

pub type DashboardResult<T> = Result<T, DashboardError>;

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownProduct(_) | Self::NoData(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(ParseError::Index(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(ParseError::Date(_)) => StatusCode::BAD_REQUEST,
            Self::Template(_) | Self::Data(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Data(err) => format!("{:#}", err),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!("{}", message);
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DashboardError::UnknownProduct("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DashboardError::from(ParseError::Date("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DashboardError::from(ParseError::Index("spx".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DashboardError::from(anyhow::anyhow!("disk")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
