pub mod list;
pub mod save;
pub mod status;
pub mod toggle;
pub mod unsave;

use crate::api::{error_response, internal_error};
use crate::services::bookmarks::BookmarkError;
use crate::AppState;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/saved-recipes", get(list::list_saved))
        .route(
            "/api/recipes/{id}/saved",
            get(status::saved_status)
                .put(save::save_recipe)
                .delete(unsave::unsave_recipe),
        )
        .route("/api/recipes/{id}/save", post(toggle::toggle_saved))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SavedStatusResponse {
    pub saved: bool,
}

fn bookmark_error_response(err: BookmarkError) -> Response {
    match err {
        BookmarkError::RecipeNotFound => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        BookmarkError::AlreadySaved => {
            error_response(StatusCode::CONFLICT, "Recipe is already saved.")
        }
        BookmarkError::NotSaved => error_response(StatusCode::NOT_FOUND, "Recipe is not saved."),
        BookmarkError::Store(e) => internal_error("Bookmark operation failed", e),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_saved,
        status::saved_status,
        toggle::toggle_saved,
        save::save_recipe,
        unsave::unsave_recipe,
    ),
    components(schemas(SavedStatusResponse))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (BookmarkError::RecipeNotFound, StatusCode::NOT_FOUND),
            (BookmarkError::AlreadySaved, StatusCode::CONFLICT),
            (BookmarkError::NotSaved, StatusCode::NOT_FOUND),
            (
                BookmarkError::Store(StoreError::Database("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(bookmark_error_response(err).status(), status);
        }
    }
}
