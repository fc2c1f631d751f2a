use super::authored_comment;
use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::comments;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

/// Delete a comment. Its replies are removed with it.
#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the comment's author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_comment(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path((recipe_id, comment_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    if let Err(response) = authored_comment(&mut conn, recipe_id, comment_id, user.id) {
        return response;
    }

    match diesel::delete(comments::table.find(comment_id)).execute(&mut conn) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error("Failed to delete comment", e),
    }
}
