use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    routes::AppState,
    services::chat::ChatReply,
};

#[derive(Debug, Deserialize)]
pub struct ChatMessageBody {
    pub message: String,
}

/// Answers a wellness question. Identity is optional; only identified
/// callers have the exchange logged.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    user: Option<CurrentUser>,
    Json(body): Json<ChatMessageBody>,
) -> AppResult<Json<ChatReply>> {
    let user_id = user.map(|CurrentUser(id)| id);
    let reply = state.chat.reply(user_id, &body.message).await?;

    Ok(Json(reply))
}
