use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{AppState, mailer, rate_limiter, repositories, reset, routes, session, sweeper, token};
use common::{cache, database};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Initialize Redis connection pool for the token denylist
    let redis_config = cache::RedisConfig::from_env()?;
    let redis_pool = cache::RedisPool::new(&redis_config).await?;

    // Initialize token service
    let token_config = token::TokenConfig::from_env()?;
    let token_service = token::TokenService::new(token_config)?;

    let admin_repository = repositories::AdminRepository::new(pool.clone());
    let rate_limiter = rate_limiter::RateLimiter::new(rate_limiter::RateLimiterConfig::from_env());

    let reset_store = reset::ResetTokenStore::new(pool.clone(), admin_repository.clone());
    let mailer = mailer::Mailer::new(&mailer::MailerConfig::from_env()?)?;

    let session_manager = session::SessionManager::new(
        admin_repository,
        token_service.clone(),
        rate_limiter.clone(),
        redis_pool,
    );

    // Start the periodic sweeps; the scheduler handle must stay alive
    let sweeper_config = sweeper::SweeperConfig::from_env();
    let _scheduler = sweeper::start(&sweeper_config, rate_limiter, reset_store.clone()).await?;

    let app_state = AppState {
        tokens: token_service,
        sessions: session_manager,
        resets: reset_store,
        mailer,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listen_addr =
        std::env::var("AUTH_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Authentication service listening on {}", listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
