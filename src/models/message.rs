use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;
use uuid::Uuid;

use crate::models::user::User;

/// 私信
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(sender_id: &str, receiver_id: &str, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content,
            read: false,
            created_at: Utc::now(),
        }
    }

    /// 对话中的另一方
    pub fn partner_id<'a>(&'a self, me: &str) -> &'a str {
        if self.sender_id == me {
            &self.receiver_id
        } else {
            &self.sender_id
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message content cannot be empty"))]
    pub content: String,
}

/// 会话摘要：对话方资料 + 最新一条消息 + 未读数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub user_id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub latest_message: Option<Message>,
    pub unread_count: i64,
}

impl ConversationSummary {
    pub fn build(partner: &User, mut messages: Vec<Message>, me: &str) -> Self {
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let unread_count = messages
            .iter()
            .filter(|m| m.receiver_id == me && !m.read)
            .count() as i64;

        Self {
            user_id: partner.id.clone(),
            username: partner.username.clone(),
            first_name: partner.first_name.clone(),
            last_name: partner.last_name.clone(),
            profile_picture: partner.profile_picture.clone(),
            latest_message: messages.into_iter().next(),
            unread_count,
        }
    }

    /// 按最新消息时间倒序排列；没有消息的会话排在最后
    pub fn sort_by_latest(summaries: &mut [ConversationSummary]) {
        summaries.sort_by(|a, b| match (&a.latest_message, &b.latest_message) {
            (Some(m1), Some(m2)) => m2.created_at.cmp(&m1.created_at),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }
}

/// 从消息列表里提取去重后的对话方，保留首次出现顺序
pub fn conversation_partners(messages: &[Message], me: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut partners = Vec::new();
    for message in messages {
        let partner = message.partner_id(me);
        if seen.insert(partner.to_string()) {
            partners.push(partner.to_string());
        }
    }
    partners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;
    use chrono::Duration;

    fn partner_user(id: &str) -> User {
        let mut user = User::new(
            None,
            None,
            format!("user-{}", id),
            format!("{}@example.com", id),
            "hash".to_string(),
            UserRole::Beginner,
        );
        user.id = id.to_string();
        user
    }

    fn message_at(sender: &str, receiver: &str, minutes_ago: i64, read: bool) -> Message {
        let mut m = Message::new(sender, receiver, "hi".to_string());
        m.created_at = Utc::now() - Duration::minutes(minutes_ago);
        m.read = read;
        m
    }

    #[test]
    fn test_partner_id_both_directions() {
        let m = Message::new("alice", "bob", "hello".to_string());
        assert_eq!(m.partner_id("alice"), "bob");
        assert_eq!(m.partner_id("bob"), "alice");
    }

    #[test]
    fn test_conversation_partners_deduped_in_order() {
        let messages = vec![
            message_at("me", "bob", 1, true),
            message_at("carol", "me", 2, true),
            message_at("bob", "me", 3, true),
        ];
        assert_eq!(conversation_partners(&messages, "me"), vec!["bob", "carol"]);
    }

    #[test]
    fn test_summary_latest_and_unread() {
        let partner = partner_user("bob");
        let messages = vec![
            message_at("bob", "me", 30, false),
            message_at("me", "bob", 10, false),
            message_at("bob", "me", 5, false),
        ];

        let summary = ConversationSummary::build(&partner, messages, "me");

        // 自己发出的未读消息不计入未读数
        assert_eq!(summary.unread_count, 2);
        let latest = summary.latest_message.unwrap();
        assert_eq!(latest.sender_id, "bob");
    }

    #[test]
    fn test_sort_by_latest_puts_empty_last() {
        let bob = partner_user("bob");
        let carol = partner_user("carol");

        let mut summaries = vec![
            ConversationSummary::build(&bob, vec![], "me"),
            ConversationSummary::build(&carol, vec![message_at("carol", "me", 1, true)], "me"),
        ];

        ConversationSummary::sort_by_latest(&mut summaries);
        assert_eq!(summaries[0].user_id, "carol");
        assert_eq!(summaries[1].user_id, "bob");
    }
}
