use crate::{
    error::{AppError, Result},
    models::learning_update::{CreateLearningUpdateRequest, LearningUpdate, StreakResponse},
    models::user::User,
    services::Database,
    utils::validation,
};
use chrono::{Months, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

/// 学习记录服务
/// 提交或修改记录时把新技能合并进用户档案，并推进连续打卡。
#[derive(Clone)]
pub struct LearningUpdateService {
    db: Arc<Database>,
}

impl LearningUpdateService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self { db })
    }

    /// 打卡表单模板：教程 / 课程 / 项目
    pub fn templates() -> Value {
        let difficulty_options = ["BEGINNER", "INTERMEDIATE", "ADVANCED"];

        json!({
            "templates": [
                {
                    "title": "Completed a Tutorial",
                    "category": "TUTORIAL",
                    "fields": [
                        { "name": "resourceName", "label": "Tutorial Name", "type": "text", "required": true },
                        { "name": "description", "label": "What did you learn?", "type": "textarea", "required": false },
                        { "name": "skillsLearned", "label": "Skills Learned", "type": "tags", "required": true },
                        { "name": "hoursSpent", "label": "Hours Spent", "type": "number", "required": true },
                        { "name": "difficulty", "label": "Difficulty Level", "type": "select", "options": difficulty_options, "required": true },
                    ],
                },
                {
                    "title": "Completed a Course",
                    "category": "COURSE",
                    "fields": [
                        { "name": "resourceName", "label": "Course Name", "type": "text", "required": true },
                        { "name": "description", "label": "What did you learn?", "type": "textarea", "required": false },
                        { "name": "skillsLearned", "label": "Skills Learned", "type": "tags", "required": true },
                        { "name": "hoursSpent", "label": "Hours Spent", "type": "number", "required": true },
                        { "name": "difficulty", "label": "Difficulty Level", "type": "select", "options": difficulty_options, "required": true },
                    ],
                },
                {
                    "title": "Completed a Project",
                    "category": "PROJECT",
                    "fields": [
                        { "name": "resourceName", "label": "Project Name", "type": "text", "required": true },
                        { "name": "description", "label": "Describe your project", "type": "textarea", "required": true },
                        { "name": "skillsLearned", "label": "Skills Applied/Learned", "type": "tags", "required": true },
                        { "name": "hoursSpent", "label": "Hours Spent", "type": "number", "required": true },
                        { "name": "difficulty", "label": "Difficulty Level", "type": "select", "options": difficulty_options, "required": true },
                    ],
                },
            ]
        })
    }

    async fn save_user(&self, user: &User) -> Result<User> {
        let mut user = user.clone();
        user.updated_at = Utc::now();
        self.db
            .update_by_id("user", &user.id.clone(), user)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 记录一次学习活动：合并新技能、推进打卡，返回记录与更新后的用户
    pub async fn create(
        &self,
        current_user: &User,
        request: CreateLearningUpdateRequest,
    ) -> Result<(LearningUpdate, User)> {
        request.validate()?;
        for skill in &request.skills_learned {
            validation::validate_skill(skill)?;
        }

        let update = request.into_update(&current_user.id);

        let mut user = current_user.clone();
        user.skills.extend(update.skills_learned.iter().cloned());
        user.record_learning_date(update.completed_at.date_naive(), Utc::now().date_naive());
        let user = self.save_user(&user).await?;

        let created = self.db.create("learning_update", update).await?;
        info!("Learning update {} recorded for user {}", created.id, created.user_id);
        Ok((created, user))
    }

    /// 用户的全部学习记录，按完成时间倒序
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<LearningUpdate>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM learning_update WHERE user_id = $user_id ORDER BY completed_at DESC",
                json!({ "user_id": user_id }),
            )
            .await?;
        let updates: Vec<LearningUpdate> = response.take(0)?;
        Ok(updates)
    }

    async fn get_raw(&self, update_id: &str) -> Result<LearningUpdate> {
        self.db
            .get_by_id("learning_update", update_id)
            .await?
            .ok_or_else(|| AppError::not_found("Learning update"))
    }

    /// 修改记录：保留 user_id 与创建时间；
    /// 记录里新出现的技能同样合并进用户档案
    pub async fn update(
        &self,
        update_id: &str,
        current_user: &User,
        request: CreateLearningUpdateRequest,
    ) -> Result<(LearningUpdate, User)> {
        request.validate()?;
        for skill in &request.skills_learned {
            validation::validate_skill(skill)?;
        }

        let mut existing = self.get_raw(update_id).await?;
        if existing.user_id != current_user.id {
            return Err(AppError::forbidden("You are not authorized to update this learning update"));
        }

        let new_skills: Vec<String> = request
            .skills_learned
            .iter()
            .filter(|s| !existing.skills_learned.contains(s) && !current_user.skills.contains(*s))
            .cloned()
            .collect();

        existing.title = request.title;
        existing.description = request.description;
        existing.category = request.category;
        existing.difficulty = request.difficulty;
        existing.resource_name = request.resource_name;
        existing.hours_spent = request.hours_spent;
        existing.skills_learned = request.skills_learned;
        if let Some(completed_at) = request.completed_at {
            existing.completed_at = completed_at;
        }

        let user = if new_skills.is_empty() {
            current_user.clone()
        } else {
            debug!("Merging {} new skills into user {}", new_skills.len(), current_user.id);
            let mut user = current_user.clone();
            user.skills.extend(new_skills);
            self.save_user(&user).await?
        };

        let saved = self
            .db
            .update_by_id("learning_update", update_id, existing)
            .await?
            .ok_or_else(|| AppError::not_found("Learning update"))?;
        Ok((saved, user))
    }

    pub async fn delete(&self, update_id: &str, current_user: &User) -> Result<()> {
        let existing = self.get_raw(update_id).await?;
        if existing.user_id != current_user.id {
            return Err(AppError::forbidden("You are not authorized to delete this learning update"));
        }

        self.db.delete_by_id("learning_update", update_id).await?;
        info!("Learning update deleted: {}", update_id);
        Ok(())
    }

    /// 连续打卡概览与近六个月的热力图
    pub async fn streak(&self, user_id: &str) -> Result<StreakResponse> {
        let user: User = self
            .db
            .get_by_id("user", user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let today = Utc::now().date_naive();
        let since = today.checked_sub_months(Months::new(6)).unwrap_or(today);

        Ok(StreakResponse {
            current_streak: user.current_streak,
            longest_streak: user.longest_streak,
            last_learning_date: user.last_learning_date,
            heatmap_data: user.learning_heatmap(since),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_cover_all_categories() {
        let templates = LearningUpdateService::templates();
        let list = templates["templates"].as_array().unwrap();
        assert_eq!(list.len(), 3);

        let categories: Vec<&str> = list
            .iter()
            .map(|t| t["category"].as_str().unwrap())
            .collect();
        assert_eq!(categories, vec!["TUTORIAL", "COURSE", "PROJECT"]);

        // 每个模板都带有完整的表单字段定义
        for template in list {
            let fields = template["fields"].as_array().unwrap();
            assert_eq!(fields.len(), 5);
            assert!(fields.iter().any(|f| f["name"] == "difficulty"));
        }
    }
}
