use crate::api::{error_response, ErrorResponse};
use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::services::account_deletion::{self, AccountError, DeletionMode};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Both fields are optional here so a missing one is reported as a
/// validation error with its own message.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
    /// `delete_all` or `keep_data`
    pub mode: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// Malformed JSON and mistyped fields are validation failures like any other.
fn parse_body(
    body: Result<Json<DeleteAccountRequest>, JsonRejection>,
) -> Result<DeleteAccountRequest, AccountError> {
    body.map(|Json(req)| req).map_err(|rejection| {
        tracing::debug!(error = %rejection, "unreadable account deletion request");
        AccountError::InvalidInput(
            "The request body must be a JSON object with a password and a mode.".to_string(),
        )
    })
}

fn parse_request(req: &DeleteAccountRequest) -> Result<(&str, DeletionMode), AccountError> {
    let mode = match req.mode.as_deref() {
        Some(mode) => mode.parse::<DeletionMode>()?,
        None => {
            return Err(AccountError::InvalidInput(
                "The mode field is required.".to_string(),
            ))
        }
    };
    let password = req.password.as_deref().unwrap_or_default();
    Ok((password, mode))
}

fn account_error_response(err: AccountError) -> Response {
    match err {
        AccountError::InvalidInput(message) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, message)
        }
        AccountError::Unauthorized => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "The provided password is incorrect.",
        ),
        // Already logged with context by the service
        AccountError::TransactionFailed(_) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong while deleting your account. Please try again.",
        ),
    }
}

/// Delete the caller's account.
///
/// With `delete_all` every recipe, comment and rating the user created is
/// removed. With `keep_data` that content stays but is no longer attributed.
/// All sessions of the account, including the current one, end on success.
#[utoipa::path(
    delete,
    path = "/api/profile",
    tag = "profile",
    request_body(content = DeleteAccountRequest, example = json!({"password": "password123", "mode": "keep_data"})),
    responses(
        (status = 200, description = "Account deleted", body = DeleteAccountResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 422, description = "Malformed body, invalid mode, missing password or wrong password", body = ErrorResponse),
        (status = 500, description = "Deletion failed, nothing was changed", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_account(
    AuthUser { user, .. }: AuthUser,
    State(pool): State<Arc<DbPool>>,
    body: Result<Json<DeleteAccountRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match parse_body(body) {
        Ok(req) => req,
        Err(e) => return account_error_response(e),
    };
    let (password, mode) = match parse_request(&req) {
        Ok(v) => v,
        Err(e) => return account_error_response(e),
    };

    match account_deletion::delete_account(pool.as_ref(), &user, password, mode) {
        Ok(_) => (
            StatusCode::OK,
            Json(DeleteAccountResponse {
                success: true,
                message: "Account deleted successfully.".to_string(),
            }),
        )
            .into_response(),
        Err(e) => account_error_response(e),
    }
}
