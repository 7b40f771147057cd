use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::NewActivity,
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct TrackedResponse {
    pub message: &'static str,
    pub activity_id: i64,
}

/// Records a client-reported activity for the caller
pub async fn track(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(mut activity): Json<NewActivity>,
) -> AppResult<(StatusCode, Json<TrackedResponse>)> {
    activity.user_id = user_id;
    let record = state.activity.record(activity).await?;

    Ok((
        StatusCode::CREATED,
        Json(TrackedResponse {
            message: "Activity tracked successfully",
            activity_id: record.id,
        }),
    ))
}
