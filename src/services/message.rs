use crate::{
    error::{AppError, Result},
    models::message::{conversation_partners, ConversationSummary, Message, SendMessageRequest},
    models::user::User,
    services::Database,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

#[derive(Clone)]
pub struct MessagingService {
    db: Arc<Database>,
}

impl MessagingService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn send(
        &self,
        current_user: &User,
        receiver_id: &str,
        request: SendMessageRequest,
    ) -> Result<Message> {
        request.validate()?;

        let receiver: Option<User> = self.db.get_by_id("user", receiver_id).await?;
        if receiver.is_none() {
            return Err(AppError::BadRequest("User not found".to_string()));
        }

        let message = Message::new(&current_user.id, receiver_id, request.content);
        let created = self.db.create("message", message).await?;
        debug!("Message {} sent from {} to {}", created.id, current_user.id, receiver_id);
        Ok(created)
    }

    async fn fetch_between(&self, a: &str, b: &str) -> Result<Vec<Message>> {
        let mut response = self
            .db
            .query_with_params(
                r#"
                    SELECT * FROM message
                    WHERE (sender_id = $a AND receiver_id = $b)
                    OR (sender_id = $b AND receiver_id = $a)
                "#,
                json!({ "a": a, "b": b }),
            )
            .await?;
        let messages: Vec<Message> = response.take(0)?;
        Ok(messages)
    }

    /// 与某个用户的完整对话，按时间正序；
    /// 读取的同时把自己收到的未读消息标记为已读
    pub async fn conversation(&self, current_user: &User, partner_id: &str) -> Result<Vec<Message>> {
        let mut messages = self.fetch_between(&current_user.id, partner_id).await?;
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let has_unread = messages
            .iter()
            .any(|m| m.receiver_id == current_user.id && !m.read);

        if has_unread {
            self.db
                .query_with_params(
                    r#"
                        UPDATE message SET read = true
                        WHERE receiver_id = $me AND sender_id = $partner AND read = false
                    "#,
                    json!({ "me": current_user.id, "partner": partner_id }),
                )
                .await?;

            // 返回给调用方的列表同步标记
            for message in &mut messages {
                if message.receiver_id == current_user.id {
                    message.read = true;
                }
            }
        }

        Ok(messages)
    }

    /// 会话总览：每个对话方一条摘要，按最新消息排序
    pub async fn conversations(&self, current_user: &User) -> Result<Vec<ConversationSummary>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM message WHERE sender_id = $me OR receiver_id = $me ORDER BY created_at DESC",
                json!({ "me": current_user.id }),
            )
            .await?;
        let all_messages: Vec<Message> = response.take(0)?;

        let mut summaries = Vec::new();
        for partner_id in conversation_partners(&all_messages, &current_user.id) {
            let partner: Option<User> = self.db.get_by_id("user", &partner_id).await?;
            if let Some(partner) = partner {
                let conversation = all_messages
                    .iter()
                    .filter(|m| m.partner_id(&current_user.id) == partner_id)
                    .cloned()
                    .collect();
                summaries.push(ConversationSummary::build(&partner, conversation, &current_user.id));
            }
        }

        ConversationSummary::sort_by_latest(&mut summaries);
        Ok(summaries)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT count() AS count FROM message WHERE receiver_id = $me AND read = false GROUP ALL",
                json!({ "me": user_id }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;

        Ok(rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }
}
