//! Router construction, middleware and rate limiting.

use std::env;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use governor::{
    DefaultDirectRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;
use crate::domain::RateLimitResponse;

use super::handlers::{ApiDoc, health_check_handler, liveness_handler, readiness_handler};
use super::{algo, multitoken};

/// Signed transactions are hex encoded and may be large
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Global rate limit settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 20,
        }
    }
}

impl RateLimitConfig {
    /// Read `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`, keeping defaults for
    /// missing or unparsable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |key: &str, default: u32| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            requests_per_second: read("RATE_LIMIT_RPS", defaults.requests_per_second),
            burst_size: read("RATE_LIMIT_BURST", defaults.burst_size),
        }
    }

    fn quota(&self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rate);
        Quota::per_second(rate).allow_burst(burst)
    }
}

fn algorand_routes() -> Router<Arc<AppState>> {
    let indexer = get(algo::indexer_get_handler).post(algo::indexer_post_handler);
    let algod = get(algo::algod_get_handler).post(algo::algod_post_handler);

    Router::new()
        .route("/node/indexer/{xApiKey}", indexer.clone())
        .route("/node/indexer/{xApiKey}/{*path}", indexer)
        .route("/node/algod/{xApiKey}", algod.clone())
        .route("/node/algod/{xApiKey}/{*path}", algod)
        .route("/wallet", get(algo::wallet_handler))
        .route("/address/{fromPrivateKey}", get(algo::address_handler))
        .route("/account/balance/{address}", get(algo::balance_handler))
        .route("/transaction", post(algo::send_transaction_handler))
        .route("/transaction/{txid}", get(algo::transaction_handler))
        .route("/broadcast", post(algo::broadcast_handler))
        .route("/block/current", get(algo::current_block_handler))
        .route("/block/{roundNumber}", get(algo::block_handler))
        .route("/transactions/{from}/{to}", get(algo::pay_transactions_handler))
}

fn multitoken_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transaction", post(multitoken::transfer_handler))
        .route("/transaction/batch", post(multitoken::transfer_batch_handler))
        .route(
            "/transaction/{chain}/{hash}",
            get(multitoken::transaction_handler),
        )
        .route("/mint", post(multitoken::mint_handler))
        .route("/mint/batch", post(multitoken::mint_batch_handler))
        .route("/burn", post(multitoken::burn_handler))
        .route("/burn/batch", post(multitoken::burn_batch_handler))
        .route("/deploy", post(multitoken::deploy_handler))
        .route("/royalty", put(multitoken::update_cashback_handler))
        .route(
            "/royalty/{chain}/{contractAddress}/{tokenId}",
            get(multitoken::royalty_handler),
        )
        .route(
            "/metadata/{chain}/{contractAddress}/{tokenId}",
            get(multitoken::metadata_handler),
        )
        .route(
            "/address/{chain}/{address}/{contractAddress}",
            get(multitoken::tokens_of_owner_handler),
        )
}

fn base_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/algorand", algorand_routes())
        .nest("/multitoken", multitoken_routes())
        .route("/health", get(health_check_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

fn with_middleware(router: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Build the application router without rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    with_middleware(base_router()).with_state(state)
}

/// Build the application router behind a global rate limiter
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    info!(
        requests_per_second = config.requests_per_second,
        burst_size = config.burst_size,
        "Global rate limiting enabled"
    );
    let limiter = Arc::new(RateLimiter::direct(config.quota()));
    let router = base_router().layer(middleware::from_fn_with_state(limiter, rate_limit));
    with_middleware(router).with_state(state)
}

async fn rate_limit(
    State(limiter): State<Arc<DefaultDirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            let retry_after = wait.as_secs().max(1);
            warn!(retry_after, "Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                [("retry-after", retry_after.to_string())],
                Json(RateLimitResponse {
                    message: "Too many requests".to_string(),
                    code: "rate.limited".to_string(),
                    retry_after,
                }),
            )
                .into_response()
        }
    }
}
