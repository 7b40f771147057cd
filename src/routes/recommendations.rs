use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::{CurrentUser, RequestId},
    models::{ActivityKind, Category, NewActivity, RecommendationItem},
    routes::AppState,
};

const DEFAULT_LIMIT: usize = 6;
const MAX_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct RecommendationParams {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

impl RecommendationParams {
    fn validated(self) -> AppResult<(Option<Category>, usize)> {
        let category = self
            .category
            .filter(|c| !c.is_empty())
            .map(|c| c.parse::<Category>())
            .transpose()?;

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::InvalidInput(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }

        Ok((category, limit))
    }
}

/// Personalized recommendations for the caller
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<RecommendationParams>,
) -> AppResult<Json<Vec<RecommendationItem>>> {
    let (category, limit) = params.validated()?;
    let profile = state.users.profile(user_id).await?;

    let items = state.recommender.recommend(&profile, category, limit).await;

    tracing::info!(
        request_id = %request_id,
        user_id,
        category = ?category,
        strategy = state.recommender.strategy_name(),
        returned = items.len(),
        "Recommendations served"
    );

    let kind = if category.is_some() {
        ActivityKind::ViewCategory
    } else {
        ActivityKind::ViewContent
    };
    let view = NewActivity::new(user_id, kind)
        .category(category)
        .metadata("recommendation_count", items.len());
    if let Err(e) = state.activity.record(view).await {
        tracing::warn!(
            request_id = %request_id,
            user_id,
            error = %e,
            "Failed to record recommendation view"
        );
    }

    Ok(Json(items))
}
