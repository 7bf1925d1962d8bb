use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::PgPool;
use storefront_core::Role;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::TokenKeys;

/// Correlation id for one request; handlers echo it in the response `meta`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// The signed-in caller, inserted by [`require_user`] and [`require_admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// What the auth middleware needs: token keys to verify the bearer token and
/// the pool to confirm the account still exists.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub tokens: TokenKeys,
    pub pool: PgPool,
}

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window counters keyed by client address. A client's window starts
/// with its first request and is dropped once it elapses.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<IpAddr, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Peer address recorded by the listener. Requests without one (in-process
/// callers) share the unspecified address.
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |ConnectInfo(addr)| {
            addr.ip()
        })
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(MiddlewareErrorBody {
            error: MiddlewareError { code, message },
        }),
    )
        .into_response()
}

/// Reuses the caller's `x-request-id` or mints a `UUIDv4`, exposes it to
/// handlers as [`RequestId`] and mirrors it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

async fn authenticate(auth: &AuthState, header: Option<&HeaderValue>) -> Result<AuthUser, Response> {
    let Some(token) = extract_bearer_token(header) else {
        return Err(reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Not authorized, no token",
        ));
    };

    let user_id = auth
        .tokens
        .verify(token)
        .and_then(|claims| claims.user_id())
        .map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            reject(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Not authorized, token failed",
            )
        })?;

    // Role comes from the stored account so demotions apply immediately.
    match storefront_db::get_user(&auth.pool, user_id).await {
        Ok(Some(user)) => Ok(AuthUser {
            id: user.id,
            role: user.role(),
        }),
        Ok(None) => Err(reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "User no longer exists",
        )),
        Err(e) => {
            tracing::error!(error = %e, "auth lookup failed");
            Err(reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "database query failed",
            ))
        }
    }
}

/// Middleware requiring a valid session token.
pub async fn require_user(State(auth): State<AuthState>, mut req: Request, next: Next) -> Response {
    match authenticate(&auth, req.headers().get(AUTHORIZATION)).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(rejection) => rejection,
    }
}

/// Middleware requiring a valid session token for an admin account.
pub async fn require_admin(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&auth, req.headers().get(AUTHORIZATION)).await {
        Ok(user) if user.is_admin() => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(user) => {
            tracing::warn!(user_id = user.id, "admin route refused");
            reject(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Not authorized as an admin",
            )
        }
        Err(rejection) => rejection,
    }
}

/// Answers 429 once the caller's address has made `max_requests` requests
/// inside its current window.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    let now = Instant::now();

    let mut clients = rate_limit.clients.lock().await;
    clients.retain(|_, w| now.duration_since(w.started_at) < rate_limit.window);

    let window = clients.entry(ip).or_insert(RateLimitWindow {
        started_at: now,
        count: 0,
    });

    if window.count >= rate_limit.max_requests {
        tracing::debug!(client = %ip, "rate limit exceeded");
        return reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many requests from this IP, please try again later.",
        );
    }

    window.count += 1;
    drop(clients);

    next.run(req).await
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        let blank = HeaderValue::from_static("Bearer   ");
        assert_eq!(extract_bearer_token(Some(&blank)), None);
    }

    #[tokio::test]
    async fn rate_limit_rejects_requests_past_the_window_budget() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                enforce_rate_limit,
            ));

        for _ in 0..2 {
            let res = app
                .clone()
                .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }

        let res = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    fn from_peer(ip: [u8; 4]) -> Request {
        Request::builder()
            .uri("/")
            .extension(ConnectInfo(SocketAddr::from((ip, 40_000))))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn rate_limit_counts_each_client_address_separately() {
        let limiter = RateLimitState::new(1, Duration::from_secs(60));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                enforce_rate_limit,
            ));

        let first = app.clone().oneshot(from_peer([10, 0, 0, 1])).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let other = app.clone().oneshot(from_peer([10, 0, 0, 2])).await.unwrap();
        assert_eq!(other.status(), StatusCode::OK);

        let repeat = app.oneshot(from_peer([10, 0, 0, 1])).await.unwrap();
        assert_eq!(repeat.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn rate_limit_forgets_clients_after_the_window() {
        let limiter = RateLimitState::new(1, Duration::from_millis(20));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter.clone(),
                enforce_rate_limit,
            ));

        let res = app.clone().oneshot(from_peer([10, 0, 0, 3])).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let res = app.oneshot(from_peer([10, 0, 0, 4])).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        // The expired window for 10.0.0.3 was pruned on the second request.
        assert_eq!(limiter.clients.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn request_id_is_echoed_on_the_response() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(request_id));

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()["x-request-id"], "req-123");
    }
}
