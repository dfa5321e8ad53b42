use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub log_level: String,

    // Database configuration
    pub database_url: String,
    pub database_namespace: String,
    pub database_name: String,
    pub database_username: String,
    pub database_password: String,

    // Authentication configuration
    pub jwt_secret: String,
    pub jwt_expiry_seconds: i64,
    pub auth_cache_ttl_seconds: i64,

    // Storage configuration
    pub storage_type: String,
    pub media_storage_path: String,
    pub s3_endpoint: Option<String>,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub max_upload_size: u64,
    pub allowed_image_types: String,

    // Content settings
    pub max_post_length: usize,
    pub max_comment_length: usize,
    pub max_message_length: usize,
    pub max_bio_length: usize,
    pub default_posts_per_page: usize,
    pub default_notifications_per_page: usize,

    // Feature flags
    pub enable_registrations: bool,
    pub enable_notifications: bool,
    pub enable_media_uploads: bool,

    // Rate limiting
    pub rate_limit_requests: u32,
    pub rate_limit_window: u64,

    // Search configuration
    pub search_min_length: usize,
    pub search_max_results: usize,

    // Notification retention
    pub notification_retention_days: i64,

    // CORS configuration
    pub cors_allowed_origins: String,

    // Monitoring
    pub metrics_enabled: bool,
    pub metrics_port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            database_namespace: env::var("DATABASE_NAMESPACE")
                .unwrap_or_else(|_| "rainbow".to_string()),
            database_name: env::var("DATABASE_NAME")
                .unwrap_or_else(|_| "learn".to_string()),
            database_username: env::var("DATABASE_USERNAME")
                .unwrap_or_else(|_| "root".to_string()),
            database_password: env::var("DATABASE_PASSWORD")
                .unwrap_or_else(|_| "root".to_string()),

            jwt_secret: env::var("JWT_SECRET")
                .expect("JWT_SECRET must be set"),
            jwt_expiry_seconds: env::var("JWT_EXPIRY_SECONDS")
                .unwrap_or_else(|_| "604800".to_string())
                .parse()?,
            auth_cache_ttl_seconds: env::var("AUTH_CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()?,

            storage_type: env::var("STORAGE_TYPE")
                .unwrap_or_else(|_| "local".to_string()),
            media_storage_path: env::var("MEDIA_STORAGE_PATH")
                .unwrap_or_else(|_| "./data/media".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_bucket: env::var("S3_BUCKET")
                .unwrap_or_else(|_| "rainbow-learn".to_string()),
            s3_region: env::var("S3_REGION")
                .unwrap_or_else(|_| "us-east-1".to_string()),
            s3_access_key: env::var("S3_ACCESS_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            s3_secret_key: env::var("S3_SECRET_KEY")
                .unwrap_or_else(|_| "minioadmin".to_string()),
            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .unwrap_or_else(|_| "10485760".to_string())
                .parse()?,
            allowed_image_types: env::var("ALLOWED_IMAGE_TYPES")
                .unwrap_or_else(|_| "jpeg,jpg,png,gif,webp".to_string()),

            max_post_length: env::var("MAX_POST_LENGTH")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
            max_comment_length: env::var("MAX_COMMENT_LENGTH")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            max_message_length: env::var("MAX_MESSAGE_LENGTH")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()?,
            max_bio_length: env::var("MAX_BIO_LENGTH")
                .unwrap_or_else(|_| "160".to_string())
                .parse()?,
            default_posts_per_page: env::var("DEFAULT_POSTS_PER_PAGE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            default_notifications_per_page: env::var("DEFAULT_NOTIFICATIONS_PER_PAGE")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            enable_registrations: env::var("ENABLE_REGISTRATIONS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,
            enable_notifications: env::var("ENABLE_NOTIFICATIONS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,
            enable_media_uploads: env::var("ENABLE_MEDIA_UPLOADS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,

            rate_limit_requests: env::var("RATE_LIMIT_REQUESTS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            rate_limit_window: env::var("RATE_LIMIT_WINDOW")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,

            search_min_length: env::var("SEARCH_MIN_LENGTH")
                .unwrap_or_else(|_| "2".to_string())
                .parse()?,
            search_max_results: env::var("SEARCH_MAX_RESULTS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            notification_retention_days: env::var("NOTIFICATION_RETENTION_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            metrics_enabled: env::var("METRICS_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
