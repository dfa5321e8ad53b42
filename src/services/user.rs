use crate::{
    config::Config,
    error::{AppError, Result},
    models::notification::Notification,
    models::user::{User, UserProfileUpdateRequest, UserSearchResult},
    services::{auth, Database, NotificationService},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct UserService {
    db: Arc<Database>,
    notification_service: NotificationService,
    config: Config,
}

impl UserService {
    pub async fn new(
        db: Arc<Database>,
        notification_service: NotificationService,
        config: &Config,
    ) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
            config: config.clone(),
        })
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<User>> {
        self.db.get_by_id("user", user_id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.db.find_one("user", "email", email).await
    }

    pub async fn save(&self, user: &User) -> Result<User> {
        let mut user = user.clone();
        user.updated_at = chrono::Utc::now();
        self.db
            .update_by_id("user", &user.id.clone(), user)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 更新个人资料，只动请求里给出的字段。
    /// 返回更新后的用户与邮箱是否变更（变更时调用方需要重签令牌）。
    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UserProfileUpdateRequest,
    ) -> Result<(User, bool)> {
        request.validate()?;

        let mut user: User = self
            .db
            .get_by_id("user", user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let original_email = user.email.clone();
        let mut email_changed = false;

        if let Some(bio) = request.bio {
            user.bio = Some(bio);
        }
        if let Some(skills) = request.skills {
            user.skills = skills;
        }
        if let Some(picture) = request.profile_picture {
            user.profile_picture = Some(picture);
        }
        if let Some(first_name) = request.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = request.last_name {
            user.last_name = Some(last_name);
        }

        if let Some(email) = request.email {
            if !email.is_empty() && email != original_email {
                let existing: Option<User> = self.db.find_one("user", "email", &email).await?;
                if existing.is_some() {
                    warn!("Email already in use: {}", email);
                    return Err(AppError::BadRequest("Email already in use".to_string()));
                }
                info!("Email updated from '{}' to '{}'", original_email, email);
                user.email = email;
                email_changed = true;
            }
        }

        if let Some(new_password) = request.new_password {
            if !new_password.is_empty() {
                let current = request
                    .current_password
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        AppError::BadRequest("Current password is required to update password".to_string())
                    })?;

                if !auth::verify_password(&current, &user.password)? {
                    warn!("Incorrect current password provided for user {}", user_id);
                    return Err(AppError::BadRequest("Current password is incorrect".to_string()));
                }

                user.password = auth::hash_password(&new_password)?;
                info!("Password updated for user: {}", user_id);
            }
        }

        let saved = self.save(&user).await?;
        Ok((saved, email_changed))
    }

    /// 按用户名/姓名/技能搜索用户，结果排除自己
    pub async fn search(&self, query: &str, current_user: &User) -> Result<Vec<UserSearchResult>> {
        let query = query.trim();
        if query.len() < self.config.search_min_length {
            return Err(AppError::Validation("Search query is too short".to_string()));
        }

        debug!("Searching users with query: {}", query);
        let needle = query.to_lowercase();

        let mut response = self
            .db
            .query_with_params(
                r#"
                    SELECT * FROM user
                    WHERE string::lowercase(username) CONTAINS $needle
                    OR string::lowercase(first_name ?? '') CONTAINS $needle
                    OR string::lowercase(last_name ?? '') CONTAINS $needle
                    OR $needle INSIDE skills
                    LIMIT $limit
                "#,
                json!({
                    "needle": needle,
                    "limit": self.config.search_max_results,
                }),
            )
            .await?;
        let users: Vec<User> = response.take(0)?;

        let results = users
            .into_iter()
            .filter(|u| u.id != current_user.id)
            .map(|u| {
                let is_following = current_user.following.contains(&u.id);
                u.to_search_result(is_following)
            })
            .collect();

        Ok(results)
    }

    /// 公开的用户名片
    pub async fn get_card(&self, target_id: &str, current_user: &User) -> Result<UserSearchResult> {
        let target: User = self
            .db
            .get_by_id("user", target_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let is_following = current_user.following.contains(&target.id);
        Ok(target.to_search_result(is_following))
    }

    /// 关注用户：双向维护 followers/following，并给对方发通知。
    /// 通知失败只记日志，不中断关注操作。
    pub async fn follow(&self, current_user_id: &str, target_id: &str) -> Result<String> {
        let mut current: User = self
            .db
            .get_by_id("user", current_user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("User not found".to_string()))?;
        let mut target: User = self
            .db
            .get_by_id("user", target_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("User not found".to_string()))?;

        if current.id == target.id {
            return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
        }
        if current.following.contains(&target.id) {
            return Err(AppError::BadRequest("Already following this user".to_string()));
        }

        current.following.insert(target.id.clone());
        self.save(&current).await?;

        target.followers.insert(current.id.clone());
        self.save(&target).await?;

        let notification = Notification::started_following(&target.id, &current);
        if let Err(e) = self.notification_service.create(notification).await {
            warn!("Failed to create follow notification: {}", e);
        }

        info!("User {} followed user {}", current.id, target.id);
        Ok(target.username)
    }

    pub async fn unfollow(&self, current_user_id: &str, target_id: &str) -> Result<String> {
        let mut current: User = self
            .db
            .get_by_id("user", current_user_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("User not found".to_string()))?;
        let mut target: User = self
            .db
            .get_by_id("user", target_id)
            .await?
            .ok_or_else(|| AppError::BadRequest("User not found".to_string()))?;

        if !current.following.contains(&target.id) {
            return Err(AppError::BadRequest("You are not following this user".to_string()));
        }

        current.following.remove(&target.id);
        self.save(&current).await?;

        target.followers.remove(&current.id);
        self.save(&target).await?;

        info!("User {} unfollowed user {}", current.id, target.id);
        Ok(target.username)
    }

    /// 粉丝列表（带当前用户的关注状态）
    pub async fn followers(&self, target_id: &str, current_user: &User) -> Result<Vec<UserSearchResult>> {
        let target: User = self
            .db
            .get_by_id("user", target_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let mut results = Vec::new();
        for follower_id in &target.followers {
            if let Some(follower) = self.get_by_id(follower_id).await? {
                let is_following = current_user.following.contains(&follower.id);
                results.push(follower.to_search_result(is_following));
            }
        }
        Ok(results)
    }

    /// 关注列表；列表里的人全部处于被关注状态
    pub async fn following(&self, target_id: &str, current_user: &User) -> Result<Vec<UserSearchResult>> {
        let target: User = self
            .db
            .get_by_id("user", target_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let mut results = Vec::new();
        for following_id in &target.following {
            if let Some(followed) = self.get_by_id(following_id).await? {
                let is_following = target.id == current_user.id
                    || current_user.following.contains(&followed.id);
                results.push(followed.to_search_result(is_following));
            }
        }
        Ok(results)
    }
}
