use super::{SessionResponse, UserResponse};
use crate::api::validation::{self, MAX_NAME_LEN};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::{create_session, hash_password};
use crate::config::Config;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body(content = RegisterRequest, example = json!({
        "name": "Ada",
        "email": "ada@example.com",
        "password": "password123",
        "password_confirmation": "password123"
    })),
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid input", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = crate::rate_limit::RateLimitedResponse)
    )
)]
pub async fn register(
    State(pool): State<Arc<DbPool>>,
    State(config): State<Arc<Config>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let validated = validation::required_text("name", &req.name, MAX_NAME_LEN).and_then(|name| {
        let email = validation::email(&req.email)?;
        validation::new_password(&req.password, &req.password_confirmation)?;
        Ok((name, email))
    });
    let (name, email) = match validated {
        Ok(v) => v,
        Err(message) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => return internal_error("Failed to hash password", e),
    };

    let mut conn = get_conn!(pool);

    let created = conn.transaction(|conn| {
        let user: User = diesel::insert_into(users::table)
            .values(&NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
            })
            .returning(User::as_returning())
            .get_result(conn)?;
        let token = create_session(conn, user.id, config.session_days)?;
        Ok::<_, diesel::result::Error>((user, token))
    });

    match created {
        Ok((user, token)) => {
            tracing::info!(user_id = %user.id, "account registered");
            (
                StatusCode::CREATED,
                Json(SessionResponse {
                    user: UserResponse::from(&user),
                    token,
                }),
            )
                .into_response()
        }
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => error_response(
            StatusCode::CONFLICT,
            "The email has already been taken.",
        ),
        Err(e) => internal_error("Failed to register user", e),
    }
}
