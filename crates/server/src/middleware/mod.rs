use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::daily_log::DailyLogStore;

use crate::{AppState, error::ApiError};

/// Loads the addressed daily log and stores it as a request extension so
/// detail handlers share one existence check and one fetch.
pub async fn load_daily_log_middleware(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let log = DailyLogStore::find_by_id(&state.db().conn, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Daily log {id} not found")))?;
    request.extensions_mut().insert(log);
    Ok(next.run(request).await)
}
