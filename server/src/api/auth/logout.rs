use crate::api::{internal_error, ErrorResponse};
use crate::auth::{delete_session, AuthUser};
use crate::db::DbPool;
use crate::get_conn;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// End the session the request was made with. Other sessions stay valid.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(auth: AuthUser, State(pool): State<Arc<DbPool>>) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match delete_session(&mut conn, auth.session_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("Failed to delete session", e),
    }
}
