//! JSON envelope shared by every API route.

use crate::utils::error::{AppError, ErrorSeverity, Result};
use axum::extract::FromRequestParts;
use axum::http::header::RETRY_AFTER;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};
use std::convert::Infallible;

/// Request id assigned by the request-context middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId("unknown".to_string())))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meta {
    pub fn new(request_id: &RequestId) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: Some(request_id.0.clone()),
            extra: Map::new(),
        }
    }

    fn anonymous() -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: None,
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    meta: Meta,
}

pub fn success<T: Serialize>(data: T, meta: Meta) -> Response {
    let body = Envelope {
        success: true,
        data: Some(data),
        error: None,
        meta,
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub fn failure(err: &AppError, meta: Meta) -> Response {
    let status = err.status();
    if status.is_server_error() || err.severity() >= ErrorSeverity::High {
        tracing::error!(code = err.code(), "❌ {}", err);
    } else {
        tracing::debug!(code = err.code(), "Request rejected: {}", err);
    }

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Something went wrong on our end.".to_string()
    } else {
        err.user_friendly_message()
    };
    let field = match err {
        AppError::ValidationError { field, .. } => Some(field.clone()),
        _ => None,
    };

    let body: Envelope<()> = Envelope {
        success: false,
        data: None,
        error: Some(ErrorBody {
            code: err.code(),
            message,
            field,
        }),
        meta,
    };
    let mut response = (status, Json(body)).into_response();
    if let AppError::RateLimited { retry_after_secs } = err {
        if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
    }
    response
}

pub fn respond<T: Serialize>(result: Result<T>, meta: Meta) -> Response {
    match result {
        Ok(data) => success(data, meta),
        Err(err) => failure(&err, meta),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        failure(&self, Meta::anonymous())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let rid = RequestId("req-1".to_string());
        let response = success(vec![1, 2], Meta::new(&rid).with("source", "live"));
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["meta"]["request_id"], "req-1");
        assert_eq!(json["meta"]["source"], "live");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 7 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RETRY_AFTER], "7");

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn test_validation_error_names_field() {
        let rid = RequestId("req-2".to_string());
        let response = failure(&AppError::validation("zip", "required"), Meta::new(&rid));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["field"], "zip");
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
    }
}
