pub mod delete;
pub mod get;
pub mod password;
pub mod update;

use crate::AppState;
use axum::routing::{get, put};
use axum::Router;
use utoipa::OpenApi;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/profile",
            get(get::get_profile)
                .put(update::update_profile)
                .delete(delete::delete_account),
        )
        .route("/api/profile/password", put(password::change_password))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        get::get_profile,
        update::update_profile,
        password::change_password,
        delete::delete_account,
    ),
    components(schemas(
        get::ProfileResponse,
        get::ActivityCounts,
        update::UpdateProfileRequest,
        password::ChangePasswordRequest,
        delete::DeleteAccountRequest,
        delete::DeleteAccountResponse,
        crate::services::account_deletion::DeletionMode,
    ))
)]
pub struct ApiDoc;
