use crate::{
    config::Config,
    error::Result,
    models::notification::Notification,
    services::Database,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<Database>,
    config: Config,
}

impl NotificationService {
    pub async fn new(db: Arc<Database>, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    /// 写入一条通知。调用方负责决定失败时是否中断主流程
    /// （点赞/评论/关注等场景只记日志，不影响主操作）。
    pub async fn create(&self, notification: Notification) -> Result<Notification> {
        if !self.config.enable_notifications {
            debug!("Notifications disabled, dropping {:?}", notification.notification_type);
            return Ok(notification);
        }
        let created = self.db.create("notification", notification).await?;
        debug!("Created {:?} notification for user {}", created.notification_type, created.user_id);
        Ok(created)
    }

    /// 用户的全部通知，新的在前
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM notification WHERE user_id = $user_id ORDER BY created_at DESC",
                json!({ "user_id": user_id }),
            )
            .await?;
        let notifications: Vec<Notification> = response.take(0)?;
        Ok(notifications)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT count() AS count FROM notification WHERE user_id = $user_id AND read = false GROUP ALL",
                json!({ "user_id": user_id }),
            )
            .await?;
        let rows: Vec<Value> = response.take(0)?;

        Ok(rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_i64())
            .unwrap_or(0))
    }

    /// 按ID批量标记已读；只允许收件人本人操作自己的通知
    pub async fn mark_read(&self, user_id: &str, notification_ids: &[String]) -> Result<()> {
        if notification_ids.is_empty() {
            return Ok(());
        }

        self.db
            .query_with_params(
                r#"
                    UPDATE notification SET read = true
                    WHERE user_id = $user_id
                    AND id IN (SELECT VALUE id FROM notification WHERE meta::id(id) IN $ids)
                "#,
                json!({ "user_id": user_id, "ids": notification_ids }),
            )
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: &str) -> Result<()> {
        self.db
            .query_with_params(
                "UPDATE notification SET read = true WHERE user_id = $user_id AND read = false",
                json!({ "user_id": user_id }),
            )
            .await?;
        Ok(())
    }

    pub async fn clear_all(&self, user_id: &str) -> Result<()> {
        self.db
            .query_with_params(
                "DELETE notification WHERE user_id = $user_id",
                json!({ "user_id": user_id }),
            )
            .await?;
        info!("Cleared all notifications for user {}", user_id);
        Ok(())
    }

    /// 清理超过保留期的已读通知，由后台任务定期调用
    pub async fn prune_old(&self) -> Result<()> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(self.config.notification_retention_days);

        self.db
            .query_with_params(
                "DELETE notification WHERE read = true AND created_at < $cutoff",
                json!({ "cutoff": cutoff }),
            )
            .await?;
        debug!("Pruned read notifications older than {}", cutoff);
        Ok(())
    }
}
