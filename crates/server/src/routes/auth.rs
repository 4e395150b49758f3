use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use protocol::{AccessToken, RefreshRequest, TokenPair, TokenRequest};
use utils::response::ApiResponse;
use utils_jwt::{TokenError, TokenType};

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token/", post(obtain_token))
        .route("/token/refresh/", post(refresh_token))
}

/// Exchanges the configured credential pair for an access/refresh token
/// pair. Wrong credentials get a 401 without detail about which half failed.
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<ResponseJson<ApiResponse<TokenPair>>, ApiError> {
    let auth = &state.config().auth;
    if payload.username != auth.username || payload.password != auth.password {
        tracing::warn!(username = %payload.username, "Rejected token request");
        return Err(ApiError::Unauthorized);
    }

    let (access, refresh) = state
        .signer()
        .issue_pair(&payload.username)
        .map_err(|err| ApiError::Internal(format!("Failed to issue tokens: {err}")))?;
    Ok(ResponseJson(ApiResponse::success(TokenPair {
        access,
        refresh,
    })))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<ResponseJson<ApiResponse<AccessToken>>, ApiError> {
    let claims = state
        .signer()
        .verify(&payload.refresh, TokenType::Refresh)
        .map_err(|err| match err {
            TokenError::Signing(err) => ApiError::Internal(format!("Failed to verify token: {err}")),
            _ => ApiError::Unauthorized,
        })?;

    let access = state
        .signer()
        .issue(&claims.sub, TokenType::Access)
        .map_err(|err| ApiError::Internal(format!("Failed to issue token: {err}")))?;
    Ok(ResponseJson(ApiResponse::success(AccessToken { access })))
}
