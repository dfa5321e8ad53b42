use crate::{
    error::Result,
    models::post::{CreateCommentRequest, CreatePostRequest, Post, SharePostRequest},
    models::user::User,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_post).get(get_feed))
        .route("/user/:user_id", get(get_user_posts))
        .route("/detail/:post_id", get(get_post))
        .route("/:post_id", get(get_post).delete(delete_post))
        .route("/:post_id/like", post(toggle_like))
        .route("/:post_id/comment", post(add_comment))
        .route("/:post_id/comments/:comment_id", delete(delete_comment))
        .route("/:post_id/share", post(share_post))
}

/// 发布动态
/// POST /api/posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    user: User,
    Json(request): Json<CreatePostRequest>,
) -> Result<Json<Post>> {
    debug!("Creating post for user: {}", user.id);

    let created = state.post_service.create(&user, request).await?;
    Ok(Json(created))
}

/// 信息流：关注的人 + 自己，新的在前
/// GET /api/posts
async fn get_feed(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<Post>>> {
    let posts = state.post_service.feed(&user).await?;
    Ok(Json(posts))
}

/// 某个用户的动态
/// GET /api/posts/user/:user_id
async fn get_user_posts(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Post>>> {
    let posts = state.post_service.user_posts(&user_id).await?;
    Ok(Json(posts))
}

/// 单条动态
/// GET /api/posts/:post_id
async fn get_post(
    State(state): State<Arc<AppState>>,
    _user: User,
    Path(post_id): Path<String>,
) -> Result<Json<Post>> {
    let post = state.post_service.get(&post_id).await?;
    Ok(Json(post))
}

/// 删除动态；原创帖级联删除它的转发
/// DELETE /api/posts/:post_id
async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Deleting post {} for user {}", post_id, user.id);

    state.post_service.delete(&post_id, &user).await?;
    Ok(Json(json!({ "message": "Post deleted successfully" })))
}

/// 点赞切换
/// POST /api/posts/:post_id/like
async fn toggle_like(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(post_id): Path<String>,
) -> Result<Json<Value>> {
    let (liked, like_count) = state.post_service.toggle_like(&post_id, &user).await?;
    Ok(Json(json!({
        "liked": liked,
        "likeCount": like_count,
    })))
}

/// 追加评论，返回更新后的帖子
/// POST /api/posts/:post_id/comment
async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(post_id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<Json<Post>> {
    debug!("User {} commenting on post {}", user.id, post_id);

    let post = state.post_service.add_comment(&post_id, &user, request).await?;
    Ok(Json(post))
}

/// 删除评论：评论作者或帖子作者可删
/// DELETE /api/posts/:post_id/comments/:comment_id
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: User,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    debug!("User {} deleting comment {} from post {}", user.id, comment_id, post_id);

    let post = state
        .post_service
        .delete_comment(&post_id, &comment_id, &user)
        .await?;
    Ok(Json(json!({
        "message": "Comment deleted successfully",
        "post": post,
    })))
}

/// 转发动态
/// POST /api/posts/:post_id/share
async fn share_post(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(post_id): Path<String>,
    Json(request): Json<SharePostRequest>,
) -> Result<Json<Value>> {
    debug!("User {} sharing post {}", user.id, post_id);

    let shared = state.post_service.share(&post_id, &user, request).await?;
    Ok(Json(json!({
        "success": true,
        "post": shared,
    })))
}
