pub mod login;
pub mod logout;
pub mod me;
pub mod register;

use crate::models::User;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Register and login. Mounted behind the stricter credential rate limit.
pub fn credential_router() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register::register))
        .route("/api/login", post(login::login))
}

/// Session endpoints for an already authenticated caller
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/logout", post(logout::logout))
        .route("/api/user", get(me::current_user))
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        register::register,
        login::login,
        logout::logout,
        me::current_user,
    ),
    components(schemas(
        register::RegisterRequest,
        login::LoginRequest,
        UserResponse,
        SessionResponse,
    ))
)]
pub struct ApiDoc;
