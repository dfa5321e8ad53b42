use crate::{
    error::Result,
    models::notification::Notification,
    models::user::{User, UserProfileUpdateRequest, UserResponse, UserSearchResult},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/search", get(search_users))
        .route("/follow/:user_id", post(follow_user))
        .route("/unfollow/:user_id", post(unfollow_user))
        .route("/followers/:user_id", get(get_followers))
        .route("/following/:user_id", get(get_following))
        .route("/notifications", get(get_notifications))
        .route("/notifications/count", get(get_notification_count))
        .route("/notifications/mark-read", post(mark_notifications_read))
        .route("/notifications/mark-all-read", post(mark_all_notifications_read))
        .route("/notifications/clear-all", delete(clear_all_notifications))
        .route("/:user_id", get(get_user))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_ids: Vec<String>,
}

/// 当前用户的完整资料
/// GET /api/users/profile
async fn get_profile(user: User) -> Result<Json<UserResponse>> {
    Ok(Json(user.to_response()))
}

/// 更新个人资料；邮箱变更时重签令牌
/// PUT /api/users/profile
async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<UserProfileUpdateRequest>,
) -> Result<Json<Value>> {
    debug!("Updating profile for user: {}", user.id);

    let (updated, email_changed) = state.user_service.update_profile(&user.id, request).await?;
    state.auth_service.invalidate_user(&user.id).await;

    let mut body = json!({ "user": updated.to_response() });
    if email_changed {
        let token = state.auth_service.issue_token(&updated)?;
        body["token"] = json!(token);
    }
    Ok(Json(body))
}

/// 按用户名/姓名/技能搜索用户
/// GET /api/users/search?query=
async fn search_users(
    State(state): State<Arc<AppState>>,
    user: User,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserSearchResult>>> {
    debug!("User {} searching for: {}", user.id, query.query);

    let results = state.user_service.search(&query.query, &user).await?;
    Ok(Json(results))
}

/// 公开的用户名片（带关注状态）
/// GET /api/users/:user_id
async fn get_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(user_id): Path<String>,
) -> Result<Json<UserSearchResult>> {
    let card = state.user_service.get_card(&user_id, &user).await?;
    Ok(Json(card))
}

/// 关注用户
/// POST /api/users/follow/:user_id
async fn follow_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("User {} following user {}", user.id, user_id);

    let username = state.user_service.follow(&user.id, &user_id).await?;
    // 关注集合变了，旧缓存资料作废
    state.auth_service.invalidate_user(&user.id).await;

    Ok(Json(json!({
        "success": true,
        "message": format!("Now following {}", username),
    })))
}

/// 取消关注
/// POST /api/users/unfollow/:user_id
async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("User {} unfollowing user {}", user.id, user_id);

    let username = state.user_service.unfollow(&user.id, &user_id).await?;
    state.auth_service.invalidate_user(&user.id).await;

    Ok(Json(json!({
        "success": true,
        "message": format!("No longer following {}", username),
    })))
}

/// 粉丝列表
/// GET /api/users/followers/:user_id
async fn get_followers(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserSearchResult>>> {
    let followers = state.user_service.followers(&user_id, &user).await?;
    Ok(Json(followers))
}

/// 关注列表
/// GET /api/users/following/:user_id
async fn get_following(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserSearchResult>>> {
    let following = state.user_service.following(&user_id, &user).await?;
    Ok(Json(following))
}

/// 当前用户的通知，新的在前
/// GET /api/users/notifications
async fn get_notifications(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.notification_service.list_for_user(&user.id).await?;
    Ok(Json(notifications))
}

/// 未读通知数（前端轮询目标）
/// GET /api/users/notifications/count
async fn get_notification_count(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Value>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(Json(json!({ "count": count })))
}

/// 按ID批量标记已读
/// POST /api/users/notifications/mark-read
async fn mark_notifications_read(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<MarkReadRequest>,
) -> Result<Json<Value>> {
    debug!("Marking {} notifications read for user {}", request.notification_ids.len(), user.id);

    state
        .notification_service
        .mark_read(&user.id, &request.notification_ids)
        .await?;
    Ok(Json(json!({ "message": "Notifications marked as read" })))
}

/// 全部标记已读
/// POST /api/users/notifications/mark-all-read
async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Value>> {
    state.notification_service.mark_all_read(&user.id).await?;
    Ok(Json(json!({ "message": "All notifications marked as read" })))
}

/// 清空通知
/// DELETE /api/users/notifications/clear-all
async fn clear_all_notifications(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Value>> {
    state.notification_service.clear_all(&user.id).await?;
    Ok(Json(json!({ "message": "All notifications cleared" })))
}
