use crate::{
    error::{AppError, Result},
    models::learning_plan::{
        CreateLearningPlanRequest, LearningPlan, LearningPlanView, UpdateLearningPlanRequest,
    },
    models::user::User,
    services::Database,
    utils::{cache::Cache, validation},
};
use futures_util::future::try_join_all;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use validator::Validate;

/// 学习计划服务：增删改查、跟随复制、周状态切换。
/// 跟随计划的源作者用户名在这里联查并缓存，
/// 前端不再需要 计划 -> 用户 的两跳请求。
#[derive(Clone)]
pub struct LearningPlanService {
    db: Arc<Database>,
    author_cache: Cache<String>,
}

impl LearningPlanService {
    pub async fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            db,
            author_cache: Cache::new(Duration::from_secs(300)),
        })
    }

    pub async fn create(&self, user: &User, request: CreateLearningPlanRequest) -> Result<LearningPlan> {
        request.validate()?;
        for resource in &request.resources {
            validation::validate_resource_url(&resource.url)?;
        }

        let plan = LearningPlan::new(
            &user.id,
            request.title,
            request.description,
            request.resources.into_iter().map(Into::into).collect(),
            request.weeks.into_iter().map(Into::into).collect(),
        );

        let created = self.db.create("learning_plan", plan).await?;
        info!("Learning plan created: {} by user {}", created.id, created.user_id);
        Ok(created)
    }

    /// 浏览视图：全部计划。
    /// 调用者自己的计划从列表里去掉，避免与"我的计划"页重复展示。
    pub async fn list_all(&self, current_user: &User) -> Result<Vec<LearningPlanView>> {
        let plans: Vec<LearningPlan> = self.db.select("learning_plan").await?;

        try_join_all(
            plans
                .into_iter()
                .filter(|p| p.user_id != current_user.id)
                .map(|p| self.enrich(p)),
        )
        .await
    }

    /// 某个用户名下的全部计划（原创 + 跟随副本）
    pub async fn plans_for_user(&self, user_id: &str) -> Result<Vec<LearningPlanView>> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM learning_plan WHERE user_id = $user_id ORDER BY created_at DESC",
                json!({ "user_id": user_id }),
            )
            .await?;
        let plans: Vec<LearningPlan> = response.take(0)?;

        try_join_all(plans.into_iter().map(|p| self.enrich(p))).await
    }

    /// 服务端划分：原创与跟随两组，划分全量且互斥
    pub async fn summary_for_user(&self, user_id: &str) -> Result<(Vec<LearningPlanView>, Vec<LearningPlanView>)> {
        let mut response = self
            .db
            .query_with_params(
                "SELECT * FROM learning_plan WHERE user_id = $user_id ORDER BY created_at DESC",
                json!({ "user_id": user_id }),
            )
            .await?;
        let plans: Vec<LearningPlan> = response.take(0)?;

        let (created, followed) = LearningPlan::partition(plans);

        let created_views = try_join_all(created.into_iter().map(|p| self.enrich(p))).await?;
        let followed_views = try_join_all(followed.into_iter().map(|p| self.enrich(p))).await?;
        Ok((created_views, followed_views))
    }

    pub async fn get(&self, plan_id: &str) -> Result<LearningPlanView> {
        let plan: LearningPlan = self
            .db
            .get_by_id("learning_plan", plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Learning plan"))?;
        self.enrich(plan).await
    }

    async fn get_raw(&self, plan_id: &str) -> Result<LearningPlan> {
        self.db
            .get_by_id("learning_plan", plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Learning plan"))
    }

    /// 整文档更新：标题、描述、周列表，给出 resources 时一并替换。
    /// 周状态切换的持久化也走这条路径。
    pub async fn update(
        &self,
        plan_id: &str,
        current_user: &User,
        request: UpdateLearningPlanRequest,
    ) -> Result<LearningPlan> {
        request.validate()?;
        for resource in request.resources.iter().flatten() {
            validation::validate_resource_url(&resource.url)?;
        }

        let mut plan = self.get_raw(plan_id).await?;
        if plan.user_id != current_user.id {
            return Err(AppError::forbidden("You can only update your own learning plans"));
        }

        plan.title = request.title;
        plan.description = request.description;
        plan.weeks = request.weeks.into_iter().map(Into::into).collect();
        if let Some(resources) = request.resources {
            plan.resources = resources.into_iter().map(Into::into).collect();
        }
        plan.updated_at = chrono::Utc::now();

        self.db
            .update_by_id("learning_plan", plan_id, plan)
            .await?
            .ok_or_else(|| AppError::not_found("Learning plan"))
    }

    /// 切换指定周：Completed 与 Not Started 互换
    pub async fn toggle_week(
        &self,
        plan_id: &str,
        current_user: &User,
        week_index: usize,
    ) -> Result<LearningPlan> {
        let mut plan = self.get_raw(plan_id).await?;
        if plan.user_id != current_user.id {
            return Err(AppError::forbidden("You can only update your own learning plans"));
        }

        let status = plan
            .toggle_week(week_index)
            .ok_or_else(|| AppError::BadRequest("Week index is out of range".to_string()))?;
        debug!("Plan {} week {} toggled to {:?}", plan_id, week_index, status);

        self.db
            .update_by_id("learning_plan", plan_id, plan)
            .await?
            .ok_or_else(|| AppError::not_found("Learning plan"))
    }

    /// 跟随计划：为调用者生成独立副本。
    /// 失败分类：源不存在 / 跟随自己的计划 / 重复跟随。
    pub async fn follow(&self, plan_id: &str, current_user: &User) -> Result<LearningPlan> {
        let source = self.get_raw(plan_id).await?;

        if source.user_id == current_user.id {
            return Err(AppError::BadRequest("Cannot follow your own learning plan".to_string()));
        }

        let mut response = self
            .db
            .query_with_params(
                r#"
                    SELECT * FROM learning_plan
                    WHERE user_id = $user_id AND source_plan_id = $source_plan_id
                "#,
                json!({ "user_id": current_user.id, "source_plan_id": plan_id }),
            )
            .await?;
        let existing: Vec<LearningPlan> = response.take(0)?;
        if !existing.is_empty() {
            return Err(AppError::BadRequest(
                "You have already followed this learning plan".to_string(),
            ));
        }

        let fork = source.fork_for(&current_user.id);
        let created = self.db.create("learning_plan", fork).await?;
        info!(
            "User {} followed learning plan {} as {}",
            current_user.id, plan_id, created.id
        );
        Ok(created)
    }

    /// 删除自己的计划，或删除跟随副本（即取消跟随）。
    /// 只删除被指名的记录，源计划不受影响。返回被删除的计划，
    /// 调用方据此区分"删除"与"取消跟随"的提示文案。
    pub async fn delete(&self, plan_id: &str, current_user: &User) -> Result<LearningPlan> {
        let plan = self.get_raw(plan_id).await?;
        if plan.user_id != current_user.id {
            return Err(AppError::forbidden("You can only delete your own learning plans"));
        }

        self.db.delete_by_id("learning_plan", plan_id).await?;
        if plan.is_fork() {
            info!("User {} unfollowed learning plan {}", current_user.id, plan_id);
        } else {
            info!("Learning plan deleted: {}", plan_id);
        }
        Ok(plan)
    }

    /// 给计划附上进度与源作者用户名
    async fn enrich(&self, plan: LearningPlan) -> Result<LearningPlanView> {
        let source_author_username = match &plan.source_plan_id {
            Some(source_id) => self.resolve_source_author(source_id).await?,
            None => None,
        };

        Ok(LearningPlanView {
            progress: plan.progress(),
            source_author_username,
            plan,
        })
    }

    /// 源计划作者的用户名，按 source_plan_id 记忆化。
    /// 源计划或作者已被删除时返回 None，视图照常渲染。
    async fn resolve_source_author(&self, source_plan_id: &str) -> Result<Option<String>> {
        if let Some(username) = self.author_cache.get(source_plan_id) {
            return Ok(Some(username));
        }

        let source: Option<LearningPlan> = self.db.get_by_id("learning_plan", source_plan_id).await?;
        let Some(source) = source else {
            return Ok(None);
        };

        let author: Option<User> = self.db.get_by_id("user", &source.user_id).await?;
        let Some(author) = author else {
            return Ok(None);
        };

        self.author_cache.set(source_plan_id, author.username.clone());
        Ok(Some(author.username))
    }
}
