use super::{SessionResponse, UserResponse};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::{create_session, verify_password};
use crate::config::Config;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "ada@example.com", "password": "password123"})),
    responses(
        (status = 200, description = "Login successful", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::rate_limit::RateLimitedResponse)
    )
)]
pub async fn login(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let user: Option<User> = match users::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(req.email.trim())
                .sql(")"),
        )
        .select(User::as_select())
        .first(&mut conn)
        .optional()
    {
        Ok(u) => u,
        Err(e) => return internal_error("Failed to look up user", e),
    };

    let user = match user {
        Some(u) if verify_password(&req.password, &u.password_hash) => u,
        _ => return error_response(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    };

    let token = match create_session(&mut conn, user.id, config.session_days) {
        Ok(t) => t,
        Err(e) => return internal_error("Failed to create session", e),
    };

    (
        StatusCode::OK,
        Json(SessionResponse {
            user: UserResponse::from(&user),
            token,
        }),
    )
        .into_response()
}
