pub mod auth;
pub mod comments;
pub mod profile;
pub mod ratings;
pub mod recipes;
pub mod saved;
pub mod validation;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

use crate::rate_limit::RateLimitedResponse;

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build an error response with the shared body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// 500 with a generic message. The detail goes to the log only.
pub fn internal_error(context: &str, err: impl std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, err);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong. Please try again.",
    )
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "ProCook API"),
        components(schemas(ErrorResponse, RateLimitedResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        auth::ApiDoc::openapi(),
        profile::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        comments::ApiDoc::openapi(),
        ratings::ApiDoc::openapi(),
        saved::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
