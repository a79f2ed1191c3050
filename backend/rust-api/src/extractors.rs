use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// `{"message": ..., "status": ...}` body used by every error the API returns.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = json!({
        "message": message.into(),
        "status": status.as_u16()
    });
    (status, Json(body)).into_response()
}

/// Custom JSON extractor that returns JSON error responses instead of plain text
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = format!("Failed to parse JSON request body: {}", rejection.body_text());
                tracing::warn!("{}", message);
                Err(api_error(StatusCode::BAD_REQUEST, message))
            }
        }
    }
}
