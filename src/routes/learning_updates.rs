use crate::{
    error::Result,
    models::learning_update::{CreateLearningUpdateRequest, LearningUpdate, StreakResponse},
    models::user::User,
    services::LearningUpdateService,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/templates", get(get_templates))
        .route("/updates", post(add_update))
        .route("/updates/user/:user_id", get(get_user_updates))
        .route("/updates/:update_id", put(edit_update).delete(delete_update))
        .route("/streak/:user_id", get(get_streak))
}

/// 打卡表单模板
/// GET /api/learning/templates
async fn get_templates(_user: User) -> Result<Json<Value>> {
    Ok(Json(LearningUpdateService::templates()))
}

/// 记录一次学习活动；返回记录与（技能、打卡已更新的）用户
/// POST /api/learning/updates
async fn add_update(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<CreateLearningUpdateRequest>,
) -> Result<Json<Value>> {
    debug!("Recording learning update for user: {}", user.id);

    let (update, updated_user) = state.learning_update_service.create(&user, request).await?;
    // 技能与打卡状态变了，旧缓存资料作废
    state.auth_service.invalidate_user(&user.id).await;

    Ok(Json(json!({
        "learningUpdate": update,
        "user": updated_user.to_response(),
    })))
}

/// 用户的学习记录，按完成时间倒序
/// GET /api/learning/updates/user/:user_id
async fn get_user_updates(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LearningUpdate>>> {
    let updates = state.learning_update_service.list_for_user(&user_id).await?;
    Ok(Json(updates))
}

/// 修改学习记录
/// PUT /api/learning/updates/:update_id
async fn edit_update(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(update_id): Path<String>,
    Json(request): Json<CreateLearningUpdateRequest>,
) -> Result<Json<Value>> {
    debug!("Updating learning update {} for user {}", update_id, user.id);

    let (update, updated_user) = state
        .learning_update_service
        .update(&update_id, &user, request)
        .await?;
    state.auth_service.invalidate_user(&user.id).await;

    Ok(Json(json!({
        "learningUpdate": update,
        "user": updated_user.to_response(),
    })))
}

/// 删除学习记录
/// DELETE /api/learning/updates/:update_id
async fn delete_update(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(update_id): Path<String>,
) -> Result<Json<Value>> {
    state.learning_update_service.delete(&update_id, &user).await?;
    Ok(Json(json!({ "message": "Learning update deleted successfully" })))
}

/// 连续打卡概览与近半年热力图
/// GET /api/learning/streak/:user_id
async fn get_streak(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(user_id): Path<String>,
) -> Result<Json<StreakResponse>> {
    let streak = state.learning_update_service.streak(&user_id).await?;
    Ok(Json(streak))
}
