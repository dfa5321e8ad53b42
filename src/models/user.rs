use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use validator::Validate;
use uuid::Uuid;
use std::collections::{HashMap, HashSet};

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    Beginner,
    Professional,
    Mentor,
}

/// 用户账户
/// followers/following 互为镜像，由 UserService 双向维护
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub skills: HashSet<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: HashSet<String>,
    #[serde(default)]
    pub following: HashSet<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    // 学习连续打卡
    #[serde(default)]
    pub current_streak: i32,
    #[serde(default)]
    pub longest_streak: i32,
    pub last_learning_date: Option<NaiveDate>,
    #[serde(default)]
    pub learning_dates: HashSet<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_enabled() -> bool {
    true
}

impl User {
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        username: String,
        email: String,
        password_hash: String,
        role: UserRole,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            username,
            email,
            password: password_hash,
            role,
            skills: HashSet::new(),
            profile_picture: None,
            bio: None,
            followers: HashSet::new(),
            following: HashSet::new(),
            enabled: true,
            current_streak: 0,
            longest_streak: 0,
            last_learning_date: None,
            learning_dates: HashSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 展示名：名 + 姓，缺失时逐级回退到用户名
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }

    /// 记录一次学习活动并推进连续打卡。
    /// 同一天重复记录不改变状态；上次活动在昨天或今天则递增，
    /// 出现间隔则重置为 1；longest_streak 取历史最大值。
    pub fn record_learning_date(&mut self, learning_date: NaiveDate, today: NaiveDate) {
        if self.learning_dates.contains(&learning_date) {
            return;
        }
        self.learning_dates.insert(learning_date);

        let yesterday = today.pred_opt().unwrap_or(today);

        match self.last_learning_date {
            None => {
                self.current_streak = 1;
                self.last_learning_date = Some(learning_date);
            }
            Some(last) if last == yesterday || last == today => {
                self.current_streak += 1;
                self.last_learning_date = Some(learning_date);
            }
            Some(last) if learning_date > last => {
                self.current_streak = 1;
                self.last_learning_date = Some(learning_date);
            }
            Some(_) => {}
        }

        if self.current_streak > self.longest_streak {
            self.longest_streak = self.current_streak;
        }
    }

    /// 日历热力图数据：窗口期内每个学习日的活动计数
    pub fn learning_heatmap(&self, since: NaiveDate) -> HashMap<String, i32> {
        let mut heatmap = HashMap::new();
        for date in self.learning_dates.iter().filter(|d| **d >= since) {
            *heatmap.entry(date.to_string()).or_insert(0) += 1;
        }
        heatmap
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            skills: self.skills.clone(),
            profile_picture: self.profile_picture.clone(),
            bio: self.bio.clone(),
            followers: self.followers.clone(),
            following: self.following.clone(),
            enabled: self.enabled,
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            last_learning_date: self.last_learning_date,
            created_at: self.created_at,
        }
    }

    pub fn to_search_result(&self, is_following: bool) -> UserSearchResult {
        UserSearchResult {
            id: self.id.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            full_name: self.full_name(),
            profile_picture: self.profile_picture.clone(),
            bio: self.bio.clone(),
            is_following,
        }
    }
}

/// 对外返回的用户信息（不含密码哈希）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub skills: HashSet<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub followers: HashSet<String>,
    pub following: HashSet<String>,
    pub enabled: bool,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_learning_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub is_following: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// 个人资料更新：所有字段可选，只更新给出的部分
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(length(max = 160, message = "Bio is too long"))]
    pub bio: Option<String>,
    pub skills: Option<HashSet<String>>,
    pub profile_picture: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub current_password: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::new(
            Some("Ada".to_string()),
            Some("Lovelace".to_string()),
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
            UserRole::Mentor,
        )
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_full_name_fallbacks() {
        let mut u = user();
        assert_eq!(u.full_name(), "Ada Lovelace");

        u.last_name = None;
        assert_eq!(u.full_name(), "Ada");

        u.first_name = None;
        u.last_name = Some("Lovelace".to_string());
        assert_eq!(u.full_name(), "Lovelace");

        u.last_name = None;
        assert_eq!(u.full_name(), "ada");
    }

    #[test]
    fn test_streak_same_day_idempotent() {
        let mut u = user();
        let today = date("2024-05-10");

        u.record_learning_date(today, today);
        u.record_learning_date(today, today);

        assert_eq!(u.current_streak, 1);
        assert_eq!(u.longest_streak, 1);
        assert_eq!(u.learning_dates.len(), 1);
    }

    #[test]
    fn test_streak_consecutive_days_increment() {
        let mut u = user();

        u.record_learning_date(date("2024-05-09"), date("2024-05-09"));
        u.record_learning_date(date("2024-05-10"), date("2024-05-10"));

        assert_eq!(u.current_streak, 2);
        assert_eq!(u.longest_streak, 2);
        assert_eq!(u.last_learning_date, Some(date("2024-05-10")));
    }

    #[test]
    fn test_streak_gap_resets() {
        let mut u = user();

        u.record_learning_date(date("2024-05-01"), date("2024-05-01"));
        u.record_learning_date(date("2024-05-02"), date("2024-05-02"));
        assert_eq!(u.current_streak, 2);

        // 三天没有活动
        u.record_learning_date(date("2024-05-06"), date("2024-05-06"));
        assert_eq!(u.current_streak, 1);
        assert_eq!(u.longest_streak, 2);
    }

    #[test]
    fn test_streak_longest_is_running_max() {
        let mut u = user();

        for day in ["2024-05-01", "2024-05-02", "2024-05-03"] {
            u.record_learning_date(date(day), date(day));
        }
        assert_eq!(u.longest_streak, 3);

        u.record_learning_date(date("2024-05-10"), date("2024-05-10"));
        assert_eq!(u.current_streak, 1);
        assert_eq!(u.longest_streak, 3);
    }

    #[test]
    fn test_learning_heatmap_window() {
        let mut u = user();
        u.learning_dates.insert(date("2024-01-01"));
        u.learning_dates.insert(date("2024-04-01"));
        u.learning_dates.insert(date("2024-05-01"));

        let heatmap = u.learning_heatmap(date("2024-03-01"));
        assert_eq!(heatmap.len(), 2);
        assert_eq!(heatmap.get("2024-04-01"), Some(&1));
        assert!(heatmap.get("2024-01-01").is_none());
    }

    #[test]
    fn test_password_not_in_response() {
        let u = user();
        let json = serde_json::to_value(u.to_response()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "ada");
    }

    #[test]
    fn test_role_wire_format() {
        let json = serde_json::to_value(UserRole::Professional).unwrap();
        assert_eq!(json, "PROFESSIONAL");
    }
}
