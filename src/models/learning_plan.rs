use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;
use uuid::Uuid;

/// 学习计划周状态
/// 线上序列化值与前端展示文案一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeekStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

/// 学习资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Video,
    Documentation,
    Article,
    Tutorial,
    Book,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: WeekStatus,
}

impl Week {
    /// 切换单周状态：Completed 与 Not Started 互换。
    /// In Progress 只能通过编辑表单进入，切换操作一律推进到 Completed。
    pub fn toggle(&mut self) -> WeekStatus {
        self.status = match self.status {
            WeekStatus::Completed => WeekStatus::NotStarted,
            WeekStatus::NotStarted | WeekStatus::InProgress => WeekStatus::Completed,
        };
        self.status
    }
}

/// 学习计划
/// source_plan_id 为空表示原创计划；非空表示这是对源计划的个人跟随副本
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlan {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub weeks: Vec<Week>,
    pub source_plan_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LearningPlan {
    pub fn new(user_id: &str, title: String, description: String, resources: Vec<Resource>, weeks: Vec<Week>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title,
            description,
            resources,
            weeks,
            source_plan_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_fork(&self) -> bool {
        self.source_plan_id.is_some()
    }

    /// 完成进度：已完成周数 / 总周数，四舍五入到整数百分比；无周时为 0
    pub fn progress(&self) -> i32 {
        if self.weeks.is_empty() {
            return 0;
        }
        let completed = self.weeks.iter().filter(|w| w.status == WeekStatus::Completed).count();
        ((completed as f64 / self.weeks.len() as f64) * 100.0).round() as i32
    }

    /// 为跟随者生成独立副本：资源原样复制，周状态全部重置，
    /// 并通过 source_plan_id 指回源计划
    pub fn fork_for(&self, follower_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: follower_id.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            resources: self.resources.clone(),
            weeks: self
                .weeks
                .iter()
                .map(|w| Week {
                    title: w.title.clone(),
                    description: w.description.clone(),
                    status: WeekStatus::NotStarted,
                })
                .collect(),
            source_plan_id: Some(self.id.clone()),
            created_at: now,
            updated_at: now,
        }
    }

    /// 切换指定周的状态；索引越界返回 None
    pub fn toggle_week(&mut self, index: usize) -> Option<WeekStatus> {
        let status = self.weeks.get_mut(index).map(Week::toggle);
        if status.is_some() {
            self.updated_at = Utc::now();
        }
        status
    }

    /// 按 source_plan_id 划分为（原创, 跟随）两组。
    /// 划分是全量且互斥的：每个计划恰好落入其中一组。
    pub fn partition(plans: Vec<LearningPlan>) -> (Vec<LearningPlan>, Vec<LearningPlan>) {
        plans.into_iter().partition(|p| p.source_plan_id.is_none())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResourceInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(url(message = "Resource url must be a valid URL"))]
    pub url: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeekInput {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: WeekStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLearningPlanRequest {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate]
    #[serde(default)]
    pub resources: Vec<ResourceInput>,
    #[validate]
    #[serde(default)]
    pub weeks: Vec<WeekInput>,
}

/// 整文档更新：周状态切换的持久化路径也走这里
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLearningPlanRequest {
    #[validate(length(min = 1, max = 100, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
    #[validate]
    #[serde(default)]
    pub weeks: Vec<WeekInput>,
    #[validate]
    pub resources: Option<Vec<ResourceInput>>,
}

impl From<ResourceInput> for Resource {
    fn from(input: ResourceInput) -> Self {
        Self {
            title: input.title,
            url: input.url,
            resource_type: input.resource_type,
        }
    }
}

impl From<WeekInput> for Week {
    fn from(input: WeekInput) -> Self {
        Self {
            title: input.title,
            description: input.description,
            status: input.status,
        }
    }
}

/// 对外返回的计划视图：附带进度与源作者用户名
/// （跟随计划的作者名由服务端联查得到，前端无需二次请求）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlanView {
    #[serde(flatten)]
    pub plan: LearningPlan,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_author_username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan_with_weeks(statuses: &[WeekStatus]) -> LearningPlan {
        let weeks = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| Week {
                title: format!("Week {}", i + 1),
                description: String::new(),
                status: *s,
            })
            .collect();
        LearningPlan::new("user-1", "Rust in 12 weeks".to_string(), String::new(), Vec::new(), weeks)
    }

    #[test]
    fn test_progress_rounding() {
        // 2/3 完成 → 67
        let plan = plan_with_weeks(&[WeekStatus::Completed, WeekStatus::NotStarted, WeekStatus::Completed]);
        assert_eq!(plan.progress(), 67);

        let plan = plan_with_weeks(&[WeekStatus::Completed, WeekStatus::Completed]);
        assert_eq!(plan.progress(), 100);

        let plan = plan_with_weeks(&[WeekStatus::NotStarted, WeekStatus::InProgress]);
        assert_eq!(plan.progress(), 0);
    }

    #[test]
    fn test_progress_empty_weeks() {
        let plan = plan_with_weeks(&[]);
        assert_eq!(plan.progress(), 0);
    }

    #[test]
    fn test_toggle_week_pair_round_trip() {
        let mut plan = plan_with_weeks(&[WeekStatus::Completed, WeekStatus::NotStarted]);

        assert_eq!(plan.toggle_week(0), Some(WeekStatus::NotStarted));
        assert_eq!(plan.toggle_week(0), Some(WeekStatus::Completed));
        assert_eq!(plan.weeks[0].status, WeekStatus::Completed);

        assert_eq!(plan.toggle_week(1), Some(WeekStatus::Completed));
        assert_eq!(plan.toggle_week(1), Some(WeekStatus::NotStarted));
        assert_eq!(plan.weeks[1].status, WeekStatus::NotStarted);
    }

    #[test]
    fn test_toggle_week_out_of_range() {
        let mut plan = plan_with_weeks(&[WeekStatus::NotStarted]);
        assert_eq!(plan.toggle_week(5), None);
    }

    #[test]
    fn test_toggle_in_progress_advances_to_completed() {
        let mut plan = plan_with_weeks(&[WeekStatus::InProgress]);
        assert_eq!(plan.toggle_week(0), Some(WeekStatus::Completed));
    }

    #[test]
    fn test_fork_resets_week_status_and_links_source() {
        let source = plan_with_weeks(&[WeekStatus::Completed, WeekStatus::InProgress]);
        let fork = source.fork_for("follower-1");

        assert_eq!(fork.user_id, "follower-1");
        assert_eq!(fork.source_plan_id.as_deref(), Some(source.id.as_str()));
        assert_ne!(fork.id, source.id);
        assert_eq!(fork.title, source.title);
        assert!(fork.weeks.iter().all(|w| w.status == WeekStatus::NotStarted));
        assert_eq!(fork.weeks.len(), source.weeks.len());
        // 源计划保持不变
        assert_eq!(source.weeks[0].status, WeekStatus::Completed);
    }

    #[test]
    fn test_fork_copies_resources_verbatim() {
        let mut source = plan_with_weeks(&[WeekStatus::Completed]);
        source.resources = vec![Resource {
            title: "The Book".to_string(),
            url: "https://doc.rust-lang.org/book/".to_string(),
            resource_type: ResourceType::Book,
        }];

        let fork = source.fork_for("follower-1");
        assert_eq!(fork.resources.len(), 1);
        assert_eq!(fork.resources[0].url, source.resources[0].url);
    }

    #[test]
    fn test_partition_total_and_disjoint() {
        let created = plan_with_weeks(&[]);
        let mut followed = plan_with_weeks(&[]);
        followed.source_plan_id = Some("source-1".to_string());

        let all = vec![created.clone(), followed.clone()];
        let (own, following) = LearningPlan::partition(all);

        assert_eq!(own.len(), 1);
        assert_eq!(following.len(), 1);
        assert_eq!(own[0].id, created.id);
        assert_eq!(following[0].id, followed.id);
    }

    #[test]
    fn test_status_wire_format() {
        let week = Week {
            title: "Week 1".to_string(),
            description: String::new(),
            status: WeekStatus::NotStarted,
        };
        let json = serde_json::to_value(&week).unwrap();
        assert_eq!(json["status"], "Not Started");

        let parsed: Week = serde_json::from_value(serde_json::json!({
            "title": "Week 1",
            "status": "In Progress"
        }))
        .unwrap();
        assert_eq!(parsed.status, WeekStatus::InProgress);
    }

    fn toggleable_status() -> impl Strategy<Value = WeekStatus> {
        prop_oneof![Just(WeekStatus::NotStarted), Just(WeekStatus::Completed)]
    }

    proptest! {
        #[test]
        fn prop_double_toggle_restores_status(status in toggleable_status()) {
            let mut week = Week {
                title: "w".to_string(),
                description: String::new(),
                status,
            };
            week.toggle();
            week.toggle();
            prop_assert_eq!(week.status, status);
        }

        #[test]
        fn prop_progress_bounded(statuses in proptest::collection::vec(
            prop_oneof![
                Just(WeekStatus::NotStarted),
                Just(WeekStatus::InProgress),
                Just(WeekStatus::Completed),
            ],
            0..32,
        )) {
            let plan = plan_with_weeks(&statuses);
            let progress = plan.progress();
            prop_assert!((0..=100).contains(&progress));
            if statuses.is_empty() {
                prop_assert_eq!(progress, 0);
            }
        }

        #[test]
        fn prop_partition_is_total(source_ids in proptest::collection::vec(
            proptest::option::of("[a-z0-9]{8}"),
            0..16,
        )) {
            let plans: Vec<LearningPlan> = source_ids
                .iter()
                .map(|source| {
                    let mut plan = plan_with_weeks(&[]);
                    plan.source_plan_id = source.clone();
                    plan
                })
                .collect();

            let total = plans.len();
            let (created, followed) = LearningPlan::partition(plans);
            prop_assert_eq!(created.len() + followed.len(), total);
            prop_assert!(created.iter().all(|p| p.source_plan_id.is_none()));
            prop_assert!(followed.iter().all(|p| p.source_plan_id.is_some()));
        }
    }
}
