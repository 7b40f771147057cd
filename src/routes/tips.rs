use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{NewTip, Tip, TipQuery, TipUpdate, TipWithAuthor},
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct EngagementResponse {
    pub message: &'static str,
    pub likes_count: i64,
    pub shares_count: i64,
}

impl EngagementResponse {
    fn new(message: &'static str, tip: &Tip) -> Self {
        Self {
            message,
            likes_count: tip.likes_count,
            shares_count: tip.shares_count,
        }
    }
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TipQuery>,
) -> AppResult<Json<Vec<TipWithAuthor>>> {
    let tips = state.tips.list(query).await?;
    Ok(Json(tips))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Json(new_tip): Json<NewTip>,
) -> AppResult<(StatusCode, Json<Tip>)> {
    let tip = state.tips.create(user_id, new_tip).await?;
    Ok((StatusCode::CREATED, Json(tip)))
}

/// Anonymous reads are allowed and are not counted as views
pub async fn get(
    State(state): State<Arc<AppState>>,
    viewer: Option<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<TipWithAuthor>> {
    let tip = state.tips.get(id, viewer.map(|CurrentUser(user_id)| user_id)).await?;
    Ok(Json(tip))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
    Json(update): Json<TipUpdate>,
) -> AppResult<Json<Tip>> {
    let tip = state.tips.update(user_id, id, update).await?;
    Ok(Json(tip))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.tips.delete(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn like(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<EngagementResponse>> {
    let tip = state.tips.like(user_id, id).await?;
    Ok(Json(EngagementResponse::new("Tip liked successfully", &tip)))
}

pub async fn share(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<EngagementResponse>> {
    let tip = state.tips.share(user_id, id).await?;
    Ok(Json(EngagementResponse::new("Tip shared successfully", &tip)))
}
