use crate::{
    error::Result,
    models::message::{ConversationSummary, Message, SendMessageRequest},
    models::user::User,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/send/:receiver_id", post(send_message))
        .route("/conversation/:user_id", get(get_conversation))
        .route("/conversations", get(get_conversations))
        .route("/unread-count", get(get_unread_count))
}

/// 发送私信
/// POST /api/messages/send/:receiver_id
async fn send_message(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(receiver_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<Message>> {
    debug!("User {} sending message to {}", user.id, receiver_id);

    let message = state
        .messaging_service
        .send(&user, &receiver_id, request)
        .await?;
    Ok(Json(message))
}

/// 与某个用户的完整对话；读取时顺带把收到的未读消息标记已读
/// GET /api/messages/conversation/:user_id
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(partner_id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    let messages = state.messaging_service.conversation(&user, &partner_id).await?;
    Ok(Json(messages))
}

/// 会话总览：每个对话方一条摘要
/// GET /api/messages/conversations
async fn get_conversations(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<ConversationSummary>>> {
    let summaries = state.messaging_service.conversations(&user).await?;
    Ok(Json(summaries))
}

/// 未读消息数（前端轮询目标）
/// GET /api/messages/unread-count
async fn get_unread_count(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Value>> {
    let count = state.messaging_service.unread_count(&user.id).await?;
    Ok(Json(json!({ "count": count })))
}
