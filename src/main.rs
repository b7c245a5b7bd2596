// Routecast API v0.1
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::routes::AppState;
use services::aggregator::RouteAggregator;
use services::open_meteo::OpenMeteoClient;
use services::rate_limit::RateLimiter;
use services::sampler;

/// Routecast API — OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Routecast API",
        version = "0.1.0",
        description = "Route planning API that scores outdoor routes by distance, \
            elevation and weather. Samples points along waypoint segments, enriches \
            them with Open-Meteo elevation and forecast data, and computes a \
            terrain- and weather-weighted difficulty for the whole route.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Routes", description = "Segment aggregation and route planning"),
    ),
    paths(
        routes::health::health_check,
        routes::routes::get_segment_elevations,
        routes::routes::plan_route,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::routes::WaypointInput,
            routes::routes::PlanRouteRequest,
            routes::routes::ElevationsResponse,
            routes::routes::PlanRouteResponse,
            services::stitcher::StoredWaypoint,
            models::SegmentPoint,
            models::TrackPoint,
            models::WeatherSample,
            models::WeatherTimelineEntry,
            models::SegmentStatistics,
            models::RouteStatistics,
            models::DifficultyLabel,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routecast_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // One limiter for the whole process: every Open-Meteo call, from any
    // request, shares the same pacing window.
    let limiter = Arc::new(RateLimiter::new(config.requests_per_minute));
    let client = OpenMeteoClient::new(&config.open_meteo_base_url, limiter.clone());

    let points_per_segment = sampler::max_points_for_budget(config.sample_budget_secs, &limiter);
    tracing::info!(
        requests_per_minute = config.requests_per_minute,
        points_per_segment,
        "sampling configured"
    );

    let app_state = AppState {
        aggregator: Arc::new(RouteAggregator::new(client, points_per_segment)),
    };

    // CORS — browser clients on other origins read and plan routes
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let route_routes = Router::new()
        .route(
            "/api/v1/routes/elevations",
            get(routes::routes::get_segment_elevations),
        )
        .route("/api/v1/routes/plan", post(routes::routes::plan_route))
        .with_state(app_state);

    let health_routes = Router::new().route("/api/v1/health", get(routes::health::health_check));

    let app = Router::new()
        .merge(health_routes)
        .merge(route_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
