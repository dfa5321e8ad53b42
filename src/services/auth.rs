use crate::{
    config::Config,
    error::{AppError, Result},
    models::user::{AuthRequest, RegisterRequest, User, UserResponse},
    services::Database,
    utils::validation,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    headers::{authorization::Bearer, Authorization},
    http::request::Parts,
    Extension, RequestPartsExt, TypedHeader,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use validator::Validate;

/// Argon2 口令哈希；注册与改密共用
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    config: Config,
    db: Arc<Database>,
    user_cache: Arc<RwLock<HashMap<String, CachedUser>>>,
}

#[derive(Debug, Clone)]
struct CachedUser {
    user: User,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // 用户ID
    pub email: String,        // 邮箱
    pub exp: i64,             // 过期时间
    pub iat: i64,             // 签发时间
}

/// 登录/注册的响应：{token, user}
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

impl AuthService {
    pub async fn new(db: Arc<Database>, config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            db,
            user_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// 注册新用户并直接签发令牌
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        request.validate()?;
        validation::validate_username(&request.username)?;
        validation::validate_password(&request.password)?;

        if !self.config.enable_registrations {
            return Err(AppError::ServiceUnavailable("Registrations are disabled".to_string()));
        }

        let existing: Option<User> = self.db.find_one("user", "email", &request.email).await?;
        if existing.is_some() {
            return Err(AppError::BadRequest("Email already exists".to_string()));
        }

        let existing: Option<User> = self.db.find_one("user", "username", &request.username).await?;
        if existing.is_some() {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(
            request.first_name,
            request.last_name,
            request.username,
            request.email,
            password_hash,
            request.role,
        );

        let created = self.db.create("user", user).await?;
        info!("Registered new user: {} ({})", created.username, created.id);

        let token = self.issue_token(&created)?;
        Ok(AuthResponse {
            token,
            user: created.to_response(),
        })
    }

    /// 凭据登录
    pub async fn login(&self, request: AuthRequest) -> Result<AuthResponse> {
        request.validate()?;

        let user: User = self
            .db
            .find_one("user", "email", &request.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !user.enabled {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        if !verify_password(&request.password, &user.password)? {
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        debug!("User logged in: {}", user.id);
        let token = self.issue_token(&user)?;
        Ok(AuthResponse {
            token,
            user: user.to_response(),
        })
    }

    /// 签发 JWT
    pub fn issue_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.config.jwt_expiry_seconds)).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;
        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    /// 按ID取用户，带短时缓存
    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        if let Some(cached) = self.get_cached_user(user_id).await {
            debug!("Using cached user data for user: {}", user_id);
            return Ok(cached);
        }

        let user: User = self
            .db
            .get_by_id("user", user_id)
            .await?
            .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

        self.cache_user(user_id, user.clone()).await;
        Ok(user)
    }

    async fn get_cached_user(&self, user_id: &str) -> Option<User> {
        let cache = self.user_cache.read().await;
        if let Some(cached) = cache.get(user_id) {
            if cached.expires_at > Utc::now() {
                return Some(cached.user.clone());
            }
        }
        None
    }

    async fn cache_user(&self, user_id: &str, user: User) {
        let mut cache = self.user_cache.write().await;
        cache.insert(
            user_id.to_string(),
            CachedUser {
                user,
                expires_at: Utc::now() + Duration::seconds(self.config.auth_cache_ttl_seconds),
            },
        );
    }

    /// 资料变更后使缓存失效，避免旧资料继续签发到响应里
    pub async fn invalidate_user(&self, user_id: &str) {
        let mut cache = self.user_cache.write().await;
        cache.remove(user_id);
    }

    // 清理过期缓存
    pub async fn cleanup_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();

        let mut user_cache = self.user_cache.write().await;
        let before_count = user_cache.len();
        user_cache.retain(|_, cached| cached.expires_at > now);
        let after_count = user_cache.len();
        debug!("Cleaned {} expired user cache entries", before_count - after_count);

        info!("Authentication cache cleanup completed");
        Ok(())
    }

    // 获取当前在线用户数（通过缓存估算）
    pub async fn get_active_user_count(&self) -> usize {
        let cache = self.user_cache.read().await;
        let now = Utc::now();
        cache.values().filter(|cached| cached.expires_at > now).count()
    }
}

// Axum extractor for authentication
#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        // 从请求头中提取 Authorization
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        // 认证服务由 auth_middleware 放进请求扩展
        let Extension(auth_service): Extension<AuthService> = parts
            .extract::<Extension<AuthService>>()
            .await
            .map_err(|_| AppError::Internal("Auth service not found in request extensions".to_string()))?;

        let claims = auth_service.verify_jwt(bearer.token())?;
        auth_service.get_user(&claims.sub).await
    }
}

// Optional authentication extractor
pub struct OptionalUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        match User::from_request_parts(parts, state).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(_) => Ok(OptionalUser(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert_ne!(hash, "correct-horse-battery");
        assert!(verify_password("correct-horse-battery", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
