use std::sync::Arc;
use axum::{
    routing::{Router, get},
    http::{Method, HeaderValue},
    middleware,
};
use tower_http::{
    cors::{CorsLayer, Any},
    compression::CompressionLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::{info, warn, error};
use tokio::time::{interval, Duration};

mod routes;
mod models;
mod services;
mod config;
mod error;
mod utils;
mod state;

#[cfg(feature = "metrics")]
mod metrics;

use crate::{
    config::Config,
    state::AppState,
    services::{
        Database,
        AuthService,
        UserService,
        PostService,
        MessagingService,
        NotificationService,
        LearningPlanService,
        LearningUpdateService,
        MediaService,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "rainbow_learn=debug,tower_http=debug".into())
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Rainbow-Learn service...");

    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化数据库连接
    let db = Arc::new(match Database::new(&config).await {
        Ok(db) => {
            match db.verify_connection().await {
                Ok(_) => {
                    info!("Database connection established successfully");
                    db
                }
                Err(e) => {
                    warn!("Database connection failed: {}", e);
                    info!("Attempting to auto-start database...");

                    // 尝试自动启动数据库
                    if let Err(start_err) = auto_start_database(&config).await {
                        error!("Failed to auto-start database: {}. Original error: {}", start_err, e);
                        return Err(anyhow::anyhow!("Database connection failed"));
                    }

                    // 重新尝试连接
                    let db = Database::new(&config).await?;
                    db.verify_connection().await?;
                    info!("Database auto-started and connected successfully");
                    db
                }
            }
        }
        Err(e) => {
            error!("Failed to create database connection: {}", e);
            return Err(anyhow::anyhow!("Database initialization failed"));
        }
    });

    // 初始化所有服务
    let auth_service = AuthService::new(db.clone(), &config).await?;
    let notification_service = NotificationService::new(db.clone(), &config).await?;
    let user_service = UserService::new(db.clone(), notification_service.clone(), &config).await?;
    let post_service = PostService::new(db.clone(), notification_service.clone()).await?;
    let messaging_service = MessagingService::new(db.clone()).await?;
    let learning_plan_service = LearningPlanService::new(db.clone()).await?;
    let learning_update_service = LearningUpdateService::new(db.clone()).await?;
    let media_service = MediaService::new(db.clone(), &config).await?;

    // 创建应用状态
    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: (*db).clone(),
        auth_service,
        user_service,
        post_service,
        messaging_service,
        notification_service,
        learning_plan_service,
        learning_update_service,
        media_service,
    });

    // 启动后台任务
    start_background_tasks(app_state.clone()).await;

    // 配置 CORS：开发环境放开，其他环境只允许配置的来源
    let cors = if config.is_development() {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(
                config.cors_allowed_origins
                    .split(',')
                    .filter_map(|origin| origin.trim().parse::<HeaderValue>().ok())
                    .collect::<Vec<_>>(),
            )
    };

    // 构建应用路由
    let app = Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/api/auth", routes::auth::router())
        .nest("/api/users", routes::users::router())
        .nest("/api/posts", routes::posts::router())
        .nest("/api/messages", routes::messages::router())
        .nest("/api/learning-plan", routes::learning_plans::router())
        .nest("/api/learning", routes::learning_updates::router())
        .nest("/api/media", routes::media::router())
        .layer(middleware::from_fn_with_state(app_state.clone(), utils::middleware::auth_middleware))
        .layer(middleware::from_fn_with_state(app_state.clone(), utils::middleware::rate_limit_middleware))
        .layer(middleware::from_fn(utils::middleware::request_logging_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // 启动指标服务器（如果启用）
    #[cfg(feature = "metrics")]
    if config.metrics_enabled {
        let metrics_app = metrics::setup_metrics().await?;
        let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
        info!("Starting metrics server on {}", metrics_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::Server::bind(&metrics_addr.parse().expect("metrics address is valid"))
                .serve(metrics_app.into_make_service())
                .await
            {
                error!("Metrics server failed: {}", e);
            }
        });
    }

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "Rainbow-Learn is running!"
}

async fn auto_start_database(config: &Config) -> anyhow::Result<()> {
    info!("Attempting to start SurrealDB...");

    // 尝试启动 SurrealDB 进程
    let output = tokio::process::Command::new("surreal")
        .args([
            "start",
            "--user", &config.database_username,
            "--pass", &config.database_password,
            "memory",
        ])
        .spawn();

    match output {
        Ok(_) => {
            info!("SurrealDB started successfully");
            // 等待数据库启动
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(())
        }
        Err(e) => {
            error!("Failed to start SurrealDB: {}", e);
            Err(anyhow::anyhow!("Failed to start database"))
        }
    }
}

async fn start_background_tasks(app_state: Arc<AppState>) {
    info!("Starting background tasks...");

    // 清理过期认证缓存
    let auth_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(3600)); // 每小时执行一次

        loop {
            interval.tick().await;
            if let Err(e) = auth_state.auth_service.cleanup_expired_sessions().await {
                error!("Failed to cleanup expired sessions: {}", e);
            }
        }
    });

    // 清理超过保留期的已读通知
    let notification_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(86400)); // 每天执行一次

        loop {
            interval.tick().await;
            if let Err(e) = notification_state.notification_service.prune_old().await {
                error!("Failed to prune old notifications: {}", e);
            }
        }
    });

    info!("Background tasks started successfully");
}
