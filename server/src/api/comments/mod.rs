pub mod create;
pub mod delete;
pub mod list;
pub mod update;

use crate::api::{error_response, internal_error};
use crate::models::Comment;
use crate::schema::comments;
use crate::AppState;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/recipes/{id}/comments",
            get(list::list_comments).post(create::create_comment),
        )
        .route(
            "/api/recipes/{id}/comments/{comment_id}",
            axum::routing::put(update::update_comment).delete(delete::delete_comment),
        )
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub recipe_id: Uuid,
    /// None when the author deleted their account but kept their content
    pub user_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Replies, oldest first. Always empty on replies themselves.
    #[schema(no_recursion)]
    pub replies: Vec<CommentResponse>,
}

impl CommentResponse {
    fn new(comment: Comment, author_name: Option<String>) -> Self {
        Self {
            id: comment.id,
            recipe_id: comment.recipe_id,
            user_id: comment.user_id,
            author_name,
            parent_id: comment.parent_id,
            body: comment.body,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            replies: Vec::new(),
        }
    }
}

/// Load a comment of `recipe_id` that `user_id` wrote, for edit and delete.
fn authored_comment(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<Comment, Response> {
    let comment: Comment = match comments::table
        .filter(comments::id.eq(comment_id))
        .filter(comments::recipe_id.eq(recipe_id))
        .select(Comment::as_select())
        .first(conn)
    {
        Ok(c) => c,
        Err(diesel::NotFound) => {
            return Err(error_response(StatusCode::NOT_FOUND, "Comment not found"))
        }
        Err(e) => return Err(internal_error("Failed to fetch comment", e)),
    };
    if comment.user_id != Some(user_id) {
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "You can only change your own comments",
        ));
    }
    Ok(comment)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_comments,
        create::create_comment,
        update::update_comment,
        delete::delete_comment,
    ),
    components(schemas(
        CommentResponse,
        list::CommentsResponse,
        create::CommentRequest,
    ))
)]
pub struct ApiDoc;
