use crate::{
    error::Result,
    models::user::{AuthRequest, RegisterRequest},
    services::auth::AuthResponse,
    state::AppState,
};
use axum::{
    extract::State,
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;
use tracing::{debug, info};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// 注册新账户
/// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    debug!("Registering new user: {}", request.email);

    let response = state.auth_service.register(request).await?;

    info!("User registered: {}", response.user.username);
    Ok(Json(response))
}

/// 凭据登录
/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuthRequest>,
) -> Result<Json<AuthResponse>> {
    debug!("Login attempt for: {}", request.email);

    let response = state.auth_service.login(request).await?;
    Ok(Json(response))
}
