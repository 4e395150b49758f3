use axum::{
    Json,
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use utils::response::ApiResponse;
use utils_jwt::TokenType;

use crate::AppState;

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn is_read_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn is_token_endpoint(req: &Request) -> bool {
    // This middleware is installed on the nested `/api` router, so paths are
    // relative to that prefix (e.g. `/token/` instead of `/api/token/`).
    req.uri().path().starts_with("/token")
}

/// Gates every mutating API call behind a valid access token. Reads and the
/// token endpoints themselves stay public.
pub async fn require_write_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if is_read_method(req.method()) || is_token_endpoint(&req) {
        return next.run(req).await;
    }

    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
        .map(str::to_string);

    let reason = match presented.as_deref() {
        None => "missing_token",
        Some(token) => match state.signer().verify(token, TokenType::Access) {
            Ok(_claims) => return next.run(req).await,
            Err(utils_jwt::TokenError::Expired) => "token_expired",
            Err(_) => "token_invalid",
        },
    };

    tracing::warn!(
        path = %req.uri().path(),
        method = %req.method(),
        reason,
        "Unauthorized API request"
    );
    let response = ApiResponse::<()>::error("Unauthorized");
    (axum::http::StatusCode::UNAUTHORIZED, Json(response)).into_response()
}
