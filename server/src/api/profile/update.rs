use crate::api::auth::UserResponse;
use crate::api::validation::{self, MAX_NAME_LEN};
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
}

#[utoipa::path(
    put,
    path = "/api/profile",
    tag = "profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Invalid input", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_profile(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    let validated = validation::required_text("name", &req.name, MAX_NAME_LEN)
        .and_then(|name| Ok((name, validation::email(&req.email)?)));
    let (name, email) = match validated {
        Ok(v) => v,
        Err(message) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let mut conn = get_conn!(pool);

    let updated: QueryResult<User> = diesel::update(users::table.find(user.id))
        .set((
            users::name.eq(name),
            users::email.eq(&email),
            users::updated_at.eq(Utc::now()),
        ))
        .returning(User::as_returning())
        .get_result(&mut conn);

    match updated {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(&user))).into_response(),
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => error_response(StatusCode::CONFLICT, "The email has already been taken."),
        Err(e) => internal_error("Failed to update profile", e),
    }
}
