use crate::{
    error::{AppError, Result},
    models::notification::Notification,
    models::post::{CreateCommentRequest, CreatePostRequest, Post, SharePostRequest},
    models::user::User,
    services::{Database, NotificationService},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct PostService {
    db: Arc<Database>,
    notification_service: NotificationService,
}

impl PostService {
    pub async fn new(db: Arc<Database>, notification_service: NotificationService) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
        })
    }

    pub async fn create(&self, author: &User, request: CreatePostRequest) -> Result<Post> {
        request.validate()?;

        let post = Post::new(author, request.content, request.media_url, request.media_type);
        let created = self.db.create("post", post).await?;
        info!("Post created: {}", created.id);
        Ok(created)
    }

    /// 信息流：关注的人的帖子加上自己的，新的在前
    pub async fn feed(&self, user: &User) -> Result<Vec<Post>> {
        let mut author_ids: Vec<String> = user.following.iter().cloned().collect();
        author_ids.push(user.id.clone());

        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE author_id IN $author_ids ORDER BY created_at DESC",
                json!({ "author_ids": author_ids }),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts)
    }

    pub async fn user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        debug!("Fetching posts for user: {}", user_id);
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM post WHERE author_id = $author_id ORDER BY created_at DESC",
                json!({ "author_id": user_id }),
            )
            .await?;
        let posts: Vec<Post> = response.take(0)?;
        Ok(posts)
    }

    pub async fn get(&self, post_id: &str) -> Result<Post> {
        self.db
            .get_by_id("post", post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    async fn save(&self, post: &Post) -> Result<Post> {
        let mut post = post.clone();
        post.updated_at = chrono::Utc::now();
        self.db
            .update_by_id("post", &post.id.clone(), post)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 删除帖子；原创帖同时级联删除它的所有转发
    pub async fn delete(&self, post_id: &str, current_user: &User) -> Result<()> {
        let post = self.get(post_id).await?;

        if post.author_id != current_user.id {
            return Err(AppError::forbidden("You are not authorized to delete this post"));
        }

        if post.original_post_id.is_none() {
            let mut response = self
                .db
                .query_with_params(
                    "SELECT * FROM post WHERE original_post_id = $post_id",
                    json!({ "post_id": post_id }),
                )
                .await?;
            let shared: Vec<Post> = response.take(0)?;
            if !shared.is_empty() {
                self.db
                    .query_with_params(
                        "DELETE post WHERE original_post_id = $post_id",
                        json!({ "post_id": post_id }),
                    )
                    .await?;
                info!("Deleted {} shared posts for original post: {}", shared.len(), post_id);
            }
        }

        self.db.delete_by_id("post", post_id).await?;
        info!("Post deleted: {}", post_id);
        Ok(())
    }

    /// 点赞切换；返回 (是否点赞, 点赞数)
    pub async fn toggle_like(&self, post_id: &str, current_user: &User) -> Result<(bool, usize)> {
        let mut post = self.get(post_id).await?;

        let liked = post.toggle_like(&current_user.id);
        let like_count = post.likes.len();
        self.save(&post).await?;

        // 只有点赞（而非取消）且不是给自己点赞时才发通知
        if liked && post.author_id != current_user.id {
            let notification = Notification::liked_post(&post.author_id, current_user, post_id);
            if let Err(e) = self.notification_service.create(notification).await {
                warn!("Failed to create like notification: {}", e);
            }
        }

        Ok((liked, like_count))
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        current_user: &User,
        request: CreateCommentRequest,
    ) -> Result<Post> {
        request.validate()?;

        let mut post = self.get(post_id).await?;
        post.add_comment(current_user, request.content);
        let updated = self.save(&post).await?;
        info!("Comment added to post: {}", post_id);

        if post.author_id != current_user.id {
            let notification = Notification::commented_on_post(&post.author_id, current_user, post_id);
            if let Err(e) = self.notification_service.create(notification).await {
                warn!("Failed to create comment notification: {}", e);
            }
        }

        Ok(updated)
    }

    /// 删除评论：评论作者或帖子作者才能删
    pub async fn delete_comment(
        &self,
        post_id: &str,
        comment_id: &str,
        current_user: &User,
    ) -> Result<Post> {
        let mut post = self.get(post_id).await?;

        let comment = post
            .find_comment(comment_id)
            .ok_or_else(|| AppError::not_found("Comment"))?;

        if comment.user_id != current_user.id && post.author_id != current_user.id {
            return Err(AppError::forbidden("You are not authorized to delete this comment"));
        }

        post.remove_comment(comment_id);
        let updated = self.save(&post).await?;
        info!("Comment {} deleted from post: {}", comment_id, post_id);
        Ok(updated)
    }

    /// 转发：生成指回源帖的副本并记录转发者
    pub async fn share(
        &self,
        post_id: &str,
        current_user: &User,
        request: SharePostRequest,
    ) -> Result<Post> {
        let mut original = self.get(post_id).await?;

        let shared = original.share_clone(current_user, request.share_message);
        let created = self.db.create("post", shared).await?;

        original.shares.insert(current_user.id.clone());
        self.save(&original).await?;

        if original.author_id != current_user.id {
            let notification = Notification::shared_post(&original.author_id, current_user, &original.id);
            if let Err(e) = self.notification_service.create(notification).await {
                warn!("Failed to create share notification: {}", e);
            }
        }

        info!("Post {} shared by user {}", post_id, current_user.id);
        Ok(created)
    }
}
