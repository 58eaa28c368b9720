use hyperlens::api::{self, AppState};
use hyperlens::config::Config;
use hyperlens::datasource::{DataSource, HyperliquidDataSource, RateLimiter};
use hyperlens::engine::BuilderFilter;
use hyperlens::services::{
    LeaderboardService, PnlService, PositionService, TradeService, UserRegistry,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing from LOG_LEVEL
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info")
            }),
        )
        .init();

    // Construct the upstream datasource
    let limiter = Arc::new(RateLimiter::with_defaults());
    let source: Arc<dyn DataSource> = match config.datasource_type.as_str() {
        "hyperliquid" => Arc::new(HyperliquidDataSource::new(
            config.hyperliquid_api_url.clone(),
            limiter,
        )),
        other => {
            eprintln!("Unsupported datasource type: {}", other);
            std::process::exit(1);
        }
    };

    // Wire services leaves-first
    let filter = BuilderFilter::new(config.target_builder.as_ref().map(|a| a.as_str()));
    let trades = Arc::new(TradeService::new(
        Arc::clone(&source),
        Duration::from_millis(config.fills_ttl_ms),
        filter.clone(),
    ));
    let positions = Arc::new(PositionService::new(Arc::clone(&trades), filter.clone()));
    let pnl = Arc::new(PnlService::new(
        Arc::clone(&trades),
        Arc::clone(&source),
        Duration::from_millis(config.clearinghouse_ttl_ms),
        filter,
        config.max_start_capital,
    ));
    let registry = Arc::new(UserRegistry::new());
    for user in &config.seed_users {
        registry.register(user);
    }
    let leaderboard = Arc::new(LeaderboardService::new(
        Arc::clone(&pnl),
        Arc::clone(&registry),
    ));

    let app = api::create_router(AppState {
        source,
        trades,
        positions,
        pnl,
        leaderboard,
        registry,
    });

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Resolve on SIGINT or SIGTERM so the server drains and exits 0.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
