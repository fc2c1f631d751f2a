use crate::api::auth::UserResponse;
use crate::api::{internal_error, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::get_conn;
use crate::schema::{comments, ratings, recipes, saved_recipes};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityCounts {
    pub recipes: i64,
    pub comments: i64,
    pub ratings: i64,
    pub saved_recipes: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    /// What would be removed, or kept, if the account were deleted
    pub counts: ActivityCounts,
}

fn count_activity(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<ActivityCounts> {
    Ok(ActivityCounts {
        recipes: recipes::table
            .filter(recipes::user_id.eq(user_id))
            .count()
            .get_result(conn)?,
        comments: comments::table
            .filter(comments::user_id.eq(user_id))
            .count()
            .get_result(conn)?,
        ratings: ratings::table
            .filter(ratings::user_id.eq(user_id))
            .count()
            .get_result(conn)?,
        saved_recipes: saved_recipes::table
            .filter(saved_recipes::user_id.eq(user_id))
            .count()
            .get_result(conn)?,
    })
}

#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "profile",
    responses(
        (status = 200, description = "Profile with activity counts", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_profile(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    let counts = count_activity(&mut conn, user.id);

    match counts {
        Ok(counts) => (
            StatusCode::OK,
            Json(ProfileResponse {
                user: UserResponse::from(&user),
                counts,
            }),
        )
            .into_response(),
        Err(e) => internal_error("Failed to count profile activity", e),
    }
}
