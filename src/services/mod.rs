pub mod database;
pub mod auth;
pub mod user;
pub mod post;
pub mod message;
pub mod notification;
pub mod learning_plan;
pub mod learning_update;
pub mod media;

// 重新导出常用类型
pub use database::Database;
pub use auth::AuthService;
pub use user::UserService;
pub use post::PostService;
pub use message::MessagingService;
pub use notification::NotificationService;
pub use learning_plan::LearningPlanService;
pub use learning_update::LearningUpdateService;
pub use media::MediaService;
