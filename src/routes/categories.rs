use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Category, CategoryInsights},
    routes::AppState,
};

/// Aggregate engagement figures for one category
pub async fn insights(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> AppResult<Json<CategoryInsights>> {
    let category: Category = category.parse()?;
    let insights = state.insights.category_insights(category).await?;
    Ok(Json(insights))
}
