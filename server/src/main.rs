mod api;
mod auth;
mod config;
mod db;
mod models;
mod rate_limit;
mod schema;
mod services;
mod store;
mod telemetry;

use axum::extract::{FromRef, MatchedPath};
use axum::http::Request;
use axum::middleware;
use axum::Router;
use config::Config;
use rate_limit::{RateLimiter, Throttle};
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<db::DbPool>,
    pub config: Arc<Config>,
}

impl FromRef<AppState> for Arc<db::DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

fn app(state: AppState) -> Router {
    let credential_throttle = Arc::new(Throttle::by_peer(RateLimiter::per_minute(
        state.config.auth_rate_limit_per_minute,
    )));
    let api_throttle = Arc::new(Throttle::by_session(
        RateLimiter::per_minute(state.config.rate_limit_per_minute),
        state.pool.clone(),
    ));

    // Register and login get their own, tighter budget
    let credential_router = api::auth::credential_router().layer(middleware::from_fn_with_state(
        credential_throttle,
        rate_limit::throttle,
    ));

    let api_router = Router::new()
        .merge(api::auth::router())
        .merge(api::profile::router())
        .merge(api::recipes::router())
        .merge(api::comments::router())
        .merge(api::ratings::router())
        .merge(api::saved::router())
        .layer(middleware::from_fn_with_state(
            api_throttle,
            rate_limit::throttle,
        ));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(credential_router)
        .merge(api_router)
        .merge(swagger_ui)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &Span| {
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
}

#[tokio::main]
async fn main() -> ExitCode {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        return match api::openapi().to_pretty_json() {
            Ok(spec) => {
                println!("{}", spec);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render OpenAPI spec: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    telemetry::init_telemetry();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let bind_addr = config.bind_addr;
    let state = AppState {
        pool: Arc::new(db::create_pool(&config.database_url)),
        config: Arc::new(config),
    };

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", bind_addr, e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Server listening on {}", bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_addr);

    // Peer addresses feed the per-client rate limit
    let service = app(state).into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, service).await {
        tracing::error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
