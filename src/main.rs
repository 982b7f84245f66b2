use axum::Router;
use routeplanner::cache::{GeocodeCache, MemoryCacheService, RedisCacheService};
use routeplanner::config::Config;
use routeplanner::constants::DEFAULT_MEMORY_CACHE_MAX_ENTRIES;
use routeplanner::services::geocoding::CachedGeocoder;
use routeplanner::services::mapbox::{AuthMode, MapboxClient};
use routeplanner::services::nominatim::NominatimClient;
use routeplanner::services::poi_service::PoiService;
use routeplanner::services::route_generator::RouteGenerator;
use routeplanner::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routeplanner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting route planner API server");
    tracing::info!(
        max_attempts = config.route_generator.max_attempts,
        "Configuration loaded successfully"
    );

    // Geocode cache: try Redis, fall back to in-memory
    let cache: Arc<dyn GeocodeCache> = if let Some(ref redis_url) = config.redis_url {
        tracing::info!("Connecting to Redis cache...");
        match RedisCacheService::new(redis_url, config.geocode_cache_ttl).await {
            Ok(redis_cache) => {
                tracing::info!("Redis cache connection established");
                Arc::new(redis_cache)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to connect to Redis: {}. Falling back to in-memory cache.",
                    e
                );
                Arc::new(MemoryCacheService::new(
                    config.geocode_cache_ttl,
                    DEFAULT_MEMORY_CACHE_MAX_ENTRIES,
                ))
            }
        }
    } else {
        tracing::info!("Redis URL not configured. Using in-memory cache.");
        Arc::new(MemoryCacheService::new(
            config.geocode_cache_ttl,
            DEFAULT_MEMORY_CACHE_MAX_ENTRIES,
        ))
    };

    // Initialize services
    let mapbox_client = if let Some(ref base_url) = config.mapbox_base_url {
        MapboxClient::with_config(
            config.mapbox_api_key.clone(),
            base_url.clone(),
            AuthMode::BearerHeader,
        )
    } else {
        MapboxClient::new(config.mapbox_api_key.clone())
    };
    let nominatim = Arc::new(NominatimClient::new(
        config.nominatim_base_url.clone(),
        config.nominatim_user_agent.clone(),
    ));
    let poi_service = PoiService::new(nominatim.clone(), &config.route_generator);
    let route_generator = RouteGenerator::new(
        Arc::new(mapbox_client),
        poi_service,
        config.route_generator.clone(),
    );
    let geocoder = CachedGeocoder::new(nominatim, cache.clone());

    // Create application state
    let state = Arc::new(AppState {
        route_generator,
        geocoder,
        cache,
    });

    // Build router with CORS and tracing
    let app = Router::new()
        .nest("/api/v1", routeplanner::routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
