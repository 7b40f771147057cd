use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{NewUser, User},
    routes::AppState,
};

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users.create(new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Json<User>> {
    let user = state.users.get(user_id).await?;
    Ok(Json(user))
}
