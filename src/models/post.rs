use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;
use uuid::Uuid;
use std::collections::HashSet;

use crate::models::user::User;

/// 动态帖子
/// 作者信息冗余存储，评论内嵌在帖子文档里（与消息流的读取模式一致）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub author_username: String,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
    pub author_profile_picture: Option<String>,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    #[serde(default)]
    pub likes: HashSet<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // 转发帖子的溯源字段
    pub original_post_id: Option<String>,
    pub share_message: Option<String>,
    #[serde(default)]
    pub shares: HashSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub user_profile_picture: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn new(author: &User, content: String, media_url: Option<String>, media_type: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            author_id: author.id.clone(),
            author_username: author.username.clone(),
            author_first_name: author.first_name.clone(),
            author_last_name: author.last_name.clone(),
            author_profile_picture: author.profile_picture.clone(),
            content,
            media_url,
            media_type,
            likes: HashSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            original_post_id: None,
            share_message: None,
            shares: HashSet::new(),
        }
    }

    pub fn is_shared_post(&self) -> bool {
        self.original_post_id.is_some()
    }

    /// 点赞切换；返回切换后该用户是否处于点赞状态
    pub fn toggle_like(&mut self, user_id: &str) -> bool {
        if self.likes.contains(user_id) {
            self.likes.remove(user_id);
            false
        } else {
            self.likes.insert(user_id.to_string());
            true
        }
    }

    pub fn add_comment(&mut self, author: &User, content: String) -> Comment {
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user_id: author.id.clone(),
            username: author.username.clone(),
            user_profile_picture: author.profile_picture.clone(),
            content,
            created_at: Utc::now(),
        };
        self.comments.push(comment.clone());
        self.updated_at = Utc::now();
        comment
    }

    /// 评论作者或帖子作者可删除评论；返回是否找到了目标评论
    pub fn remove_comment(&mut self, comment_id: &str) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != comment_id);
        let removed = self.comments.len() < before;
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    pub fn find_comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// 转发：复制内容并通过 original_post_id 指回源帖
    pub fn share_clone(&self, sharer: &User, share_message: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            author_id: sharer.id.clone(),
            author_username: sharer.username.clone(),
            author_first_name: sharer.first_name.clone(),
            author_last_name: sharer.last_name.clone(),
            author_profile_picture: sharer.profile_picture.clone(),
            content: self.content.clone(),
            media_url: self.media_url.clone(),
            media_type: self.media_type.clone(),
            likes: HashSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
            original_post_id: Some(self.id.clone()),
            share_message,
            shares: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 5000, message = "Post content cannot be empty"))]
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment content cannot be empty"))]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePostRequest {
    pub share_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn author() -> User {
        User::new(
            Some("Grace".to_string()),
            Some("Hopper".to_string()),
            "grace".to_string(),
            "grace@example.com".to_string(),
            "hash".to_string(),
            UserRole::Professional,
        )
    }

    #[test]
    fn test_toggle_like_round_trip() {
        let mut post = Post::new(&author(), "learning Rust".to_string(), None, None);

        assert!(post.toggle_like("u1"));
        assert_eq!(post.likes.len(), 1);
        assert!(!post.toggle_like("u1"));
        assert!(post.likes.is_empty());
    }

    #[test]
    fn test_add_and_remove_comment() {
        let user = author();
        let mut post = Post::new(&user, "post".to_string(), None, None);

        let comment = post.add_comment(&user, "nice".to_string());
        assert_eq!(post.comments.len(), 1);
        assert!(post.find_comment(&comment.id).is_some());

        assert!(post.remove_comment(&comment.id));
        assert!(post.comments.is_empty());
        assert!(!post.remove_comment(&comment.id));
    }

    #[test]
    fn test_share_clone_links_original() {
        let user = author();
        let mut original = Post::new(&user, "original".to_string(), None, None);
        original.toggle_like("someone");

        let shared = original.share_clone(&user, Some("worth reading".to_string()));

        assert_eq!(shared.original_post_id.as_deref(), Some(original.id.as_str()));
        assert!(shared.is_shared_post());
        assert_eq!(shared.content, original.content);
        assert!(shared.likes.is_empty());
        assert!(shared.comments.is_empty());
        assert_eq!(shared.share_message.as_deref(), Some("worth reading"));
    }
}
