use crate::{
    config::Config,
    services::{
        auth::AuthService,
        database::Database,
        learning_plan::LearningPlanService,
        learning_update::LearningUpdateService,
        media::MediaService,
        message::MessagingService,
        notification::NotificationService,
        post::PostService,
        user::UserService,
    },
};

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Database,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 动态服务
    pub post_service: PostService,

    /// 私信服务
    pub messaging_service: MessagingService,

    /// 通知服务
    pub notification_service: NotificationService,

    /// 学习计划服务
    pub learning_plan_service: LearningPlanService,

    /// 学习记录服务
    pub learning_update_service: LearningUpdateService,

    /// 媒体服务
    pub media_service: MediaService,
}
