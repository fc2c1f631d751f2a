//! Per-client request throttling for the HTTP API.

use crate::auth::{bearer_token, get_user_from_token};
use crate::db::DbPool;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fixed-window limiter: each client gets `limit` requests per `window`.
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    /// Window start and request count per client key.
    windows: DashMap<String, (Instant, u32)>,
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut entry = self.windows.entry(key.to_string()).or_insert((now, 0));
        let (started, count) = entry.value_mut();

        let elapsed = now.saturating_duration_since(*started);
        if elapsed >= self.window {
            *started = now;
            *count = 0;
        }

        if *count >= self.limit {
            return Decision::Limited {
                retry_after: self.window - now.saturating_duration_since(*started),
            };
        }
        *count += 1;
        Decision::Allowed {
            remaining: self.limit - *count,
        }
    }

    /// Drop windows that have expired. Called opportunistically so idle
    /// clients do not accumulate.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, (started, _)| now.saturating_duration_since(*started) < self.window);
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RateLimitedResponse {
    pub error: String,
    /// Seconds until the client may retry
    pub retry_after: u64,
}

/// How a request is attributed to a client.
pub enum ClientIdentity {
    /// Always the peer address. Register and login callers are anonymous.
    PeerAddress,
    /// The session's user when the bearer token resolves to a live session,
    /// otherwise the peer address.
    Session(Arc<DbPool>),
}

/// A [`RateLimiter`] together with the way it identifies clients.
pub struct Throttle {
    limiter: RateLimiter,
    identity: ClientIdentity,
}

impl Throttle {
    pub fn by_peer(limiter: RateLimiter) -> Self {
        Self {
            limiter,
            identity: ClientIdentity::PeerAddress,
        }
    }

    pub fn by_session(limiter: RateLimiter, pool: Arc<DbPool>) -> Self {
        Self {
            limiter,
            identity: ClientIdentity::Session(pool),
        }
    }
}

/// `user:<id>` when `resolve_user` accepts the bearer token, else
/// `ip:<peer>`. Unverified tokens never get a bucket of their own.
fn client_key(request: &Request<Body>, resolve_user: impl FnOnce(&str) -> Option<Uuid>) -> String {
    if let Some(user_id) = bearer_token(request.headers()).ok().and_then(resolve_user) {
        return format!("user:{}", user_id);
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_string(),
    }
}

/// Middleware applying a [`Throttle`] to every request it wraps.
pub async fn throttle(
    State(throttle): State<Arc<Throttle>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limiter = &throttle.limiter;
    if limiter.tracked_clients() > 10_000 {
        limiter.prune();
    }

    let key = match &throttle.identity {
        ClientIdentity::PeerAddress => client_key(&request, |_| None),
        ClientIdentity::Session(pool) => client_key(&request, |token| {
            get_user_from_token(pool, token).map(|(_, user)| user.id)
        }),
    };
    match limiter.check(&key) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.limit()));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Decision::Limited { retry_after } => {
            let retry_after = retry_after.as_secs().max(1);
            tracing::warn!(client = %key, retry_after, "rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(RateLimitedResponse {
                    error: "Too many requests. Please slow down.".to_string(),
                    retry_after,
                }),
            )
                .into_response();
            let headers = response.headers_mut();
            headers.insert("retry-after", HeaderValue::from(retry_after));
            headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.limit()));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            response
        }
    }
}
