use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;
use uuid::Uuid;
use std::collections::HashMap;

/// 学习记录分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpdateCategory {
    Tutorial,
    Course,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// 学习记录：完成教程/课程/项目后的打卡条目。
/// 提交时会把新技能合并进用户档案并推进连续打卡。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUpdate {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: UpdateCategory,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub skills_learned: Vec<String>,
    #[serde(default)]
    pub hours_spent: f64,
    pub resource_name: Option<String>,
    pub completed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLearningUpdateRequest {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    pub category: UpdateCategory,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub skills_learned: Vec<String>,
    #[validate(range(min = 0.0, max = 1000.0, message = "Hours spent is out of range"))]
    #[serde(default)]
    pub hours_spent: f64,
    pub resource_name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CreateLearningUpdateRequest {
    pub fn into_update(self, user_id: &str) -> LearningUpdate {
        let now = Utc::now();
        LearningUpdate {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: self.title,
            description: self.description,
            category: self.category,
            difficulty: self.difficulty,
            skills_learned: self.skills_learned,
            hours_spent: self.hours_spent,
            resource_name: self.resource_name,
            completed_at: self.completed_at.unwrap_or(now),
            created_at: now,
        }
    }
}

/// 连续打卡概览，附带近半年的日历热力图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakResponse {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_learning_date: Option<NaiveDate>,
    pub heatmap_data: HashMap<String, i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_update_defaults_completed_at() {
        let request = CreateLearningUpdateRequest {
            title: "Finished the async book".to_string(),
            description: String::new(),
            category: UpdateCategory::Tutorial,
            difficulty: Difficulty::Intermediate,
            skills_learned: vec!["async".to_string()],
            hours_spent: 4.5,
            resource_name: Some("Async Rust".to_string()),
            completed_at: None,
        };

        let update = request.into_update("user-1");
        assert_eq!(update.user_id, "user-1");
        assert_eq!(update.completed_at, update.created_at);
    }

    #[test]
    fn test_category_wire_format() {
        let json = serde_json::to_value(UpdateCategory::Project).unwrap();
        assert_eq!(json, "PROJECT");
        let parsed: Difficulty = serde_json::from_value(serde_json::json!("ADVANCED")).unwrap();
        assert_eq!(parsed, Difficulty::Advanced);
    }
}
