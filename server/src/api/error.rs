use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::GameError;

/// Error returned by every handler.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] GameError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(GameError::InvalidRequest(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::IllegalMove(_)
            | GameError::OutOfTurn
            | GameError::GameAlreadyOver
            | GameError::InvalidPhase(_)
            | GameError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GameError::NotParticipant(_) => StatusCode::FORBIDDEN,
            GameError::AiProviderFailure(_) | GameError::Persistence(_) | GameError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            GameError::Persistence(_) | GameError::Internal(_) => {
                tracing::error!("Request failed: {}", self.0);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.0.code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (GameError::NotFound("Game x".into()), StatusCode::NOT_FOUND),
            (GameError::OutOfTurn, StatusCode::BAD_REQUEST),
            (GameError::GameAlreadyOver, StatusCode::BAD_REQUEST),
            (GameError::NotParticipant("eve".into()), StatusCode::FORBIDDEN),
            (
                GameError::AiProviderFailure("timeout".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
