use crate::dispatch::DispatchRequest;
use crate::error::BroadcasterError;
use crate::logging::log_error;
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Value, json};
use std::sync::Arc;

/// JSON error body: `{error}` or `{error, details}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Map a failure while building the directory
    fn directory(err: BroadcasterError) -> Self {
        match err {
            BroadcasterError::DirectoryFetch { channels, users } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch Slack data")
                    .with_details(json!({
                        "channels": channels.as_deref().unwrap_or("OK"),
                        "users": users.as_deref().unwrap_or("OK"),
                    }))
            }
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch Slack data")
                .with_details(Value::String(other.detail())),
        }
    }

    /// Map a failure while dispatching; only validation is the caller's fault
    fn dispatch(err: BroadcasterError) -> Self {
        match err {
            BroadcasterError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to dispatch message")
                .with_details(Value::String(other.detail())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

pub async fn handle_directory(State(state): State<Arc<AppState>>) -> Response {
    match state.directory.directory().await {
        Ok(directory) => (StatusCode::OK, Json(directory.as_ref())).into_response(),
        Err(e) => {
            log_error("fetch_directory", &e);
            ApiError::directory(e).into_response()
        }
    }
}

pub async fn handle_dispatch(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DispatchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected dispatch body");
            return ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            )
            .into_response();
        }
    };

    match state.dispatcher.dispatch(request).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            if !matches!(e, BroadcasterError::Validation(_)) {
                log_error("dispatch", &e);
            }
            ApiError::dispatch(e).into_response()
        }
    }
}

pub async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "uptimeSeconds": state.started_at.elapsed().as_secs(),
            "message": "Slack broadcaster API",
        })),
    )
        .into_response()
}

/// Report which bot the configured token belongs to
pub async fn handle_auth(State(state): State<Arc<AppState>>) -> Response {
    match state.api.auth_test().await {
        Ok(identity) => {
            let mut body = json!({ "ok": true });
            if let (Some(map), Ok(Value::Object(fields))) =
                (body.as_object_mut(), serde_json::to_value(&identity))
            {
                map.extend(fields);
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            log_error("auth_test", &e);
            ApiError::new(StatusCode::BAD_GATEWAY, e.detail()).into_response()
        }
    }
}

pub async fn handle_not_found(method: Method, uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        format!("Route not found: {} {}", method, uri.path()),
    )
        .into_response()
}

/// Any OPTIONS request is answered with an empty 200; CORS headers are added outside
pub async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
