use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use explorer_client::pages::DELETE_ACCOUNT_FAILED;
use explorer_client::{IdentityError, SessionError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not signed in")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{}", DELETE_ACCOUNT_FAILED)]
    AccountDeletion,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::Session(e) => session_status(e),
            ServerError::AccountDeletion => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        if status.is_server_error() {
            tracing::warn!(error = %self, %status, "request failed");
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn session_status(e: &SessionError) -> (StatusCode, String) {
    match e {
        SessionError::NotSignedIn => (StatusCode::UNAUTHORIZED, e.to_string()),
        SessionError::Identity(IdentityError::Provider(_)) => (
            StatusCode::BAD_GATEWAY,
            "Identity provider unavailable".to_string(),
        ),
        SessionError::Identity(_) => (StatusCode::UNAUTHORIZED, e.to_string()),
        SessionError::Favorites(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Favorites store unavailable".to_string(),
        ),
    }
}
