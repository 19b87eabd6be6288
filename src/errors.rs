use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use log::error;
use serde_json::json;

// Errors raised by the match aggregate, the token codec and the storage layer.
// Only the kind is a contract; the messages may change.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("invalid player: {0}")]
    InvalidPlayer(String),
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("forbidden operation: {0}")]
    ForbiddenOperation(&'static str),
    #[error("no such match: {0}")]
    NotFound(String),
    #[error("authentication failed")]
    AuthFailure,
    #[error("concurrent update, try again")]
    Conflict,
    #[error("internal failure: {0}")]
    Internal(String),
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArguments(_) | Self::InvalidPlayer(_) | Self::InvalidPosition(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::AuthFailure => StatusCode::UNAUTHORIZED,
            Self::ForbiddenOperation(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for GameError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

// Malformed request bodies count as bad arguments, like a rejected fleet
impl From<JsonRejection> for GameError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidArguments(rejection.body_text())
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_message = match &self {
            Self::Internal(detail) => {
                error!("Internal failure: {}", detail);
                "Internal Server Error".to_string()
            }
            Self::AuthFailure => "Token is not valid".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(GameError::InvalidArguments("{}".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(GameError::InvalidPlayer("player3".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(GameError::InvalidPosition("[0,1]".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(GameError::AuthFailure.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(GameError::ForbiddenOperation("not your turn").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(GameError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(GameError::Conflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_error_response_hides_detail() {
        let response = GameError::Internal("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sqlx_errors_are_internal() {
        let err: GameError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, GameError::Internal(_)));
    }
}
