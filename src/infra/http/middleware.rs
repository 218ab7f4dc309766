use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::auth::{AuthError, Principal};

use super::AppState;
use super::error::{ApiError, codes};

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext {
        request_id: Uuid::new_v4().to_string(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();

        // Empty for requests rejected before authentication completed.
        let subject = response
            .extensions()
            .get::<Principal>()
            .map(|principal| principal.subject.clone())
            .unwrap_or_default();

        if status.is_server_error() {
            error!(
                target: "compito::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                elapsed_ms = elapsed_ms,
                request_id = request_id,
                subject = subject,
                "request failed",
            );
        } else {
            warn!(
                target: "compito::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                elapsed_ms = elapsed_ms,
                request_id = request_id,
                subject = subject,
                "client request error",
            );
        }
    }

    response
}

/// Reject requests without a valid bearer token. On success the principal
/// rides the response extensions so the logging layer above can attribute
/// the request to its subject.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers().get(header::AUTHORIZATION)) {
        Some(value) => value,
        None => return ApiError::unauthorized().into_response(),
    };

    let principal = match state.auth.validate(&token).await {
        Ok(principal) => principal,
        Err(AuthError::InvalidToken) => return ApiError::unauthorized().into_response(),
        Err(AuthError::Unavailable { message }) => {
            return ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::AUTH_BACKEND,
                "Token validation unavailable",
                Some(message),
            )
            .into_response();
        }
    };

    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let raw = header?.to_str().ok()?;
    let bearer = raw.strip_prefix("Bearer ")?;
    Some(bearer.to_string())
}
