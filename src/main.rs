use mapboard::{
    AppState, AuthorizationPolicy, GeocodingService, TokenService, VWorldClient,
    bootstrap,
    config::{AppConfig, Env},
    create_router,
    password::PasswordHasher,
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup order: configuration, logging, database and schema, collaborators,
/// administrator seeding, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging: RUST_LOG wins over the default filter.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mapboard=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database and schema
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Image storage (S3/MinIO)
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // LOCAL-ONLY: the dockerized MinIO starts without the bucket.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    // 5. Geocoding provider
    if config.geocoder_api_key.is_empty() {
        tracing::warn!("VWORLD_API_KEY is not set; geocoding requests will fail");
    }
    let vworld = VWorldClient::new(
        &config.geocoder_base_url,
        &config.geocoder_api_key,
        config.geocoder_domain.clone(),
        Duration::from_secs(config.geocoder_timeout_secs),
    )
    .expect("FATAL: Failed to build the geocoding HTTP client.");
    let geocoder = Arc::new(GeocodingService::new(Arc::new(vworld)));

    // 6. Identity services
    let tokens = Arc::new(TokenService::new(&config.jwt_secret, config.jwt_ttl_secs));
    let hasher = PasswordHasher::new(config.bcrypt_cost);

    if let Err(e) = bootstrap::ensure_admin(
        &repo,
        hasher,
        &config.admin_username,
        &config.admin_password,
    )
    .await
    {
        tracing::error!(error = %e, "admin account could not be ensured");
    }

    // 7. Router and server
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        storage,
        geocoder,
        tokens,
        policy: Arc::new(AuthorizationPolicy::standard()),
        hasher,
        config,
    };
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
