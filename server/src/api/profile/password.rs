use crate::api::validation;
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::{hash_password, verify_password, AuthUser};
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub password: String,
    pub password_confirmation: String,
}

#[utoipa::path(
    put,
    path = "/api/profile/password",
    tag = "profile",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Wrong current password or invalid new password", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<ChangePasswordRequest>,
) -> impl IntoResponse {
    if !verify_password(&req.current_password, &user.password_hash) {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The current password is incorrect.",
        );
    }
    if let Err(message) = validation::new_password(&req.password, &req.password_confirmation) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, message);
    }

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => return internal_error("Failed to hash password", e),
    };

    let mut conn = get_conn!(pool);

    match diesel::update(users::table.find(user.id))
        .set((
            users::password_hash.eq(&password_hash),
            users::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
    {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("Failed to update password", e),
    }
}
