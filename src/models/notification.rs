use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::user::User;

/// 通知类型，与前端展示图标一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationType {
    Like,
    Comment,
    Share,
    Follow,
}

/// 站内通知
/// 发送者资料冗余存储，列表渲染无需回查用户表
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub sender_id: String,
    pub sender_username: String,
    pub sender_profile_picture: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub resource_id: Option<String>,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: &str,
        sender: &User,
        notification_type: NotificationType,
        resource_id: Option<String>,
        message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: recipient_id.to_string(),
            sender_id: sender.id.clone(),
            sender_username: sender.username.clone(),
            sender_profile_picture: sender.profile_picture.clone(),
            notification_type,
            resource_id,
            message,
            read: false,
            created_at: Utc::now(),
        }
    }

    pub fn liked_post(recipient_id: &str, sender: &User, post_id: &str) -> Self {
        Self::new(
            recipient_id,
            sender,
            NotificationType::Like,
            Some(post_id.to_string()),
            format!("{} liked your post", sender.full_name()),
        )
    }

    pub fn commented_on_post(recipient_id: &str, sender: &User, post_id: &str) -> Self {
        Self::new(
            recipient_id,
            sender,
            NotificationType::Comment,
            Some(post_id.to_string()),
            format!("{} commented on your post", sender.full_name()),
        )
    }

    pub fn shared_post(recipient_id: &str, sender: &User, post_id: &str) -> Self {
        Self::new(
            recipient_id,
            sender,
            NotificationType::Share,
            Some(post_id.to_string()),
            format!("{} shared your post", sender.full_name()),
        )
    }

    pub fn started_following(recipient_id: &str, sender: &User) -> Self {
        Self::new(
            recipient_id,
            sender,
            NotificationType::Follow,
            None,
            format!("{} started following you", sender.full_name()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    #[test]
    fn test_notification_message_uses_full_name() {
        let sender = User::new(
            Some("Ada".to_string()),
            Some("Lovelace".to_string()),
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
            UserRole::Mentor,
        );

        let n = Notification::liked_post("bob", &sender, "post-1");
        assert_eq!(n.message, "Ada Lovelace liked your post");
        assert_eq!(n.notification_type, NotificationType::Like);
        assert_eq!(n.resource_id.as_deref(), Some("post-1"));
        assert!(!n.read);
    }

    #[test]
    fn test_notification_message_falls_back_to_username() {
        let mut sender = User::new(
            None,
            None,
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
            UserRole::Beginner,
        );
        sender.first_name = None;

        let n = Notification::started_following("bob", &sender);
        assert_eq!(n.message, "ada started following you");
        assert!(n.resource_id.is_none());
    }

    #[test]
    fn test_type_wire_format() {
        let json = serde_json::to_value(NotificationType::Follow).unwrap();
        assert_eq!(json, "FOLLOW");
    }
}
