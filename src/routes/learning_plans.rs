use crate::{
    error::Result,
    models::learning_plan::{
        CreateLearningPlanRequest, LearningPlan, LearningPlanView, UpdateLearningPlanRequest,
    },
    models::user::User,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_all).post(create_plan))
        .route("/user/:user_id", get(get_user_plans))
        .route("/user/:user_id/summary", get(get_user_summary))
        .route("/follow/:plan_id", post(follow_plan))
        .route("/:plan_id", get(get_plan).put(update_plan).delete(delete_plan))
        .route("/:plan_id/weeks/:week_index/toggle", patch(toggle_week))
}

/// 浏览全部学习计划（不含自己的，避免与"我的计划"重复展示）
/// GET /api/learning-plan
async fn list_all(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<LearningPlanView>>> {
    debug!("Listing all learning plans for browse view");

    let plans = state.learning_plan_service.list_all(&user).await?;
    Ok(Json(plans))
}

/// 某个用户名下的全部计划
/// GET /api/learning-plan/user/:user_id
async fn get_user_plans(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LearningPlanView>>> {
    debug!("Fetching learning plans for user: {}", user_id);

    let plans = state.learning_plan_service.plans_for_user(&user_id).await?;
    Ok(Json(plans))
}

/// 服务端划分：原创与跟随两组
/// GET /api/learning-plan/user/:user_id/summary
async fn get_user_summary(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Fetching learning plan summary for user: {}", user_id);

    let (created, followed) = state.learning_plan_service.summary_for_user(&user_id).await?;
    Ok(Json(json!({
        "created": created,
        "followed": followed,
    })))
}

/// 单个计划
/// GET /api/learning-plan/:plan_id
async fn get_plan(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(plan_id): Path<String>,
) -> Result<Json<LearningPlanView>> {
    let plan = state.learning_plan_service.get(&plan_id).await?;
    Ok(Json(plan))
}

/// 创建计划
/// POST /api/learning-plan
async fn create_plan(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<CreateLearningPlanRequest>,
) -> Result<Json<LearningPlan>> {
    debug!("Creating learning plan for user: {}", user.id);

    let plan = state.learning_plan_service.create(&user, request).await?;
    Ok(Json(plan))
}

/// 跟随计划：为自己生成独立副本
/// POST /api/learning-plan/follow/:plan_id
async fn follow_plan(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(plan_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("User {} following learning plan {}", user.id, plan_id);

    let fork = state.learning_plan_service.follow(&plan_id, &user).await?;
    Ok(Json(json!({
        "message": "Learning plan followed successfully",
        "planId": fork.id,
    })))
}

/// 整文档更新（周状态切换的持久化路径）
/// PUT /api/learning-plan/:plan_id
async fn update_plan(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(plan_id): Path<String>,
    Json(request): Json<UpdateLearningPlanRequest>,
) -> Result<Json<LearningPlan>> {
    debug!("Updating learning plan {} for user {}", plan_id, user.id);

    let plan = state.learning_plan_service.update(&plan_id, &user, request).await?;
    Ok(Json(plan))
}

/// 切换指定周的完成状态
/// PATCH /api/learning-plan/:plan_id/weeks/:week_index/toggle
async fn toggle_week(
    State(state): State<Arc<AppState>>,
    user: User,
    Path((plan_id, week_index)): Path<(String, usize)>,
) -> Result<Json<LearningPlan>> {
    debug!("Toggling week {} of plan {} for user {}", week_index, plan_id, user.id);

    let plan = state
        .learning_plan_service
        .toggle_week(&plan_id, &user, week_index)
        .await?;
    Ok(Json(plan))
}

/// 删除自己的计划或取消跟随，两者共用同一个端点
/// DELETE /api/learning-plan/:plan_id
async fn delete_plan(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(plan_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Deleting learning plan {} for user {}", plan_id, user.id);

    let removed = state.learning_plan_service.delete(&plan_id, &user).await?;
    let message = if removed.is_fork() {
        "Learning plan unfollowed successfully"
    } else {
        "Learning plan deleted successfully"
    };
    Ok(Json(json!({ "message": message })))
}
