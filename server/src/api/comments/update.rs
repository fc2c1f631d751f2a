use super::create::CommentRequest;
use super::{authored_comment, CommentResponse};
use crate::api::validation;
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Comment;
use crate::schema::comments;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

/// Edit a comment's body. `parent_id` in the request is ignored.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("id" = Uuid, Path, description = "Recipe ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the comment's author", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 422, description = "Invalid comment", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_comment(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path((recipe_id, comment_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CommentRequest>,
) -> impl IntoResponse {
    let body = match validation::comment_body(&req.body) {
        Ok(b) => b,
        Err(message) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let mut conn = get_conn!(pool);

    if let Err(response) = authored_comment(&mut conn, recipe_id, comment_id, user.id) {
        return response;
    }

    match diesel::update(comments::table.find(comment_id))
        .set((comments::body.eq(body), comments::updated_at.eq(Utc::now())))
        .returning(Comment::as_returning())
        .get_result(&mut conn)
    {
        Ok(comment) => (
            StatusCode::OK,
            Json(CommentResponse::new(comment, Some(user.name))),
        )
            .into_response(),
        Err(e) => internal_error("Failed to update comment", e),
    }
}
