//! HTTP surface: routes and middleware.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, AppState};

/// Builds the application router.
///
/// `/health` bypasses the rate limiter; everything under `/api` goes through
/// the body size limit and, when configured, per-IP rate limiting. The limit
/// is enforced by the JSON extractor, so oversized bodies get the usual JSON
/// error whether or not the request declares a `Content-Length`.
pub fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let mut lead_routes = Router::new()
        .route(
            "/api/v1/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route(
            "/api/v1/leads/:id",
            get(handlers::get_lead).delete(handlers::delete_lead),
        )
        .route("/api/v1/leads/:id/data", patch(handlers::update_lead_data))
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes));

    if let Some(limit) = state.config.rate_limit {
        let governor_conf = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(limit.per_second)
                .burst_size(limit.burst)
                .key_extractor(SmartIpKeyExtractor)
                .finish()
                .ok_or_else(|| anyhow::anyhow!("invalid rate limit configuration"))?,
        );
        lead_routes = lead_routes.layer(ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        }));
    }

    Ok(Router::new()
        .route("/health", get(handlers::health))
        .merge(lead_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()))
}
