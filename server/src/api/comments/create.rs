use super::CommentResponse;
use crate::api::validation;
use crate::api::{error_response, internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{Comment, NewComment};
use crate::schema::{comments, recipes};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub body: String,
    /// Reply to this top-level comment of the same recipe
    pub parent_id: Option<Uuid>,
}

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/comments",
    tag = "comments",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 422, description = "Invalid comment or parent", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_comment(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    Path(recipe_id): Path<Uuid>,
    Json(req): Json<CommentRequest>,
) -> impl IntoResponse {
    let body = match validation::comment_body(&req.body) {
        Ok(b) => b,
        Err(message) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, message),
    };

    let mut conn = get_conn!(pool);

    match diesel::select(diesel::dsl::exists(recipes::table.find(recipe_id)))
        .get_result::<bool>(&mut conn)
    {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return internal_error("Failed to fetch recipe", e),
    }

    if let Some(parent_id) = req.parent_id {
        // Replies are one level deep and stay on the parent's recipe
        let parent: Option<(Uuid, Option<Uuid>)> = match comments::table
            .find(parent_id)
            .select((comments::recipe_id, comments::parent_id))
            .first(&mut conn)
            .optional()
        {
            Ok(p) => p,
            Err(e) => return internal_error("Failed to fetch parent comment", e),
        };
        match parent {
            Some((parent_recipe, None)) if parent_recipe == recipe_id => {}
            _ => {
                return error_response(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "The selected parent comment is invalid.",
                )
            }
        }
    }

    let created: QueryResult<Comment> = diesel::insert_into(comments::table)
        .values(&NewComment {
            recipe_id,
            user_id: user.id,
            parent_id: req.parent_id,
            body,
        })
        .returning(Comment::as_returning())
        .get_result(&mut conn);

    match created {
        Ok(comment) => (
            StatusCode::CREATED,
            Json(CommentResponse::new(comment, Some(user.name))),
        )
            .into_response(),
        Err(e) => internal_error("Failed to create comment", e),
    }
}
