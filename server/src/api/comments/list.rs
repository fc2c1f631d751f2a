use super::CommentResponse;
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::Comment;
use crate::schema::{comments, recipes, users};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentsResponse {
    pub comments: Vec<CommentResponse>,
}

/// Nest replies under their parents. `rows` must be oldest first; top-level
/// comments come out newest first, replies stay oldest first.
fn thread(rows: Vec<(Comment, Option<String>)>) -> Vec<CommentResponse> {
    let mut replies: HashMap<Uuid, Vec<CommentResponse>> = HashMap::new();
    let mut top_level = Vec::new();

    for (comment, author) in rows {
        let response = CommentResponse::new(comment, author);
        match response.parent_id {
            Some(parent) => replies.entry(parent).or_default().push(response),
            None => top_level.push(response),
        }
    }

    top_level.reverse();
    for comment in &mut top_level {
        comment.replies = replies.remove(&comment.id).unwrap_or_default();
    }
    top_level
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/comments",
    tag = "comments",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Threaded comments", body = CommentsResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn list_comments(
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    match diesel::select(diesel::dsl::exists(recipes::table.find(recipe_id)))
        .get_result::<bool>(&mut conn)
    {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to fetch recipe", e),
    }

    let rows: Vec<(Comment, Option<String>)> = match comments::table
        .left_join(users::table)
        .filter(comments::recipe_id.eq(recipe_id))
        .order((comments::created_at.asc(), comments::id.asc()))
        .select((Comment::as_select(), users::name.nullable()))
        .load(&mut conn)
    {
        Ok(rows) => rows,
        Err(e) => return internal_error("Failed to list comments", e),
    };

    (
        StatusCode::OK,
        Json(CommentsResponse {
            comments: thread(rows),
        }),
    )
        .into_response()
}
