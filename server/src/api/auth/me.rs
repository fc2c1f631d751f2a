use super::UserResponse;
use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "auth",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn current_user(AuthUser { user, .. }: AuthUser) -> impl IntoResponse {
    Json(UserResponse::from(&user))
}
