use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Errors that reach the HTTP caller.
///
/// Upstream failures never end up here; the reconciler absorbs them.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Bad Request: {}", details)]
    BadRequest { details: String },

    #[display(fmt = "Internal Server Error: {}", details)]
    Internal { details: String },
}

impl AppError {
    pub fn bad_request(details: impl Into<String>) -> Self {
        AppError::BadRequest {
            details: details.into(),
        }
    }

    pub fn internal(details: impl Into<String>) -> Self {
        AppError::Internal {
            details: details.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, details) = match self {
            AppError::BadRequest { details } => ("Bad Request", details),
            AppError::Internal { details } => ("Internal Server Error", details),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": error,
            "details": details
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn internal_error_renders_error_and_details() {
        let response = AppError::internal("punch store failure: pool timed out").error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal Server Error");
        assert_eq!(json["details"], "punch store failure: pool timed out");
    }

    #[test]
    fn bad_request_maps_to_400() {
        assert_eq!(AppError::bad_request("nope").status_code(), StatusCode::BAD_REQUEST);
    }
}
