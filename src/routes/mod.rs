pub mod auth;
pub mod users;
pub mod posts;
pub mod messages;
pub mod learning_plans;
pub mod learning_updates;
pub mod media;
