//! Serve command implementation

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::{KilnConfig, LogFormat};
use crate::session::{IdentityService, InMemoryIdentityService};
use crate::telemetry::{FeedHandle, Ingestor, SyntheticFeed, TelemetryFeed};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load configuration with CLI overrides
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<KilnConfig, Box<dyn std::error::Error>> {
    // Load from file if it exists, otherwise use defaults
    let mut config = if args.config.exists() {
        KilnConfig::load(Some(&args.config))?
    } else {
        tracing::debug!("Config file not found, using defaults");
        KilnConfig::default()
    };

    config = config.with_env_overrides();

    // CLI overrides (highest priority)
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref log_level) = args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.no_telemetry {
        config.telemetry.enabled = false;
    }
    if let Some(seed) = args.telemetry_seed {
        config.telemetry.seed = Some(seed);
    }
    if let Some(secs) = args.idle_timeout {
        config.session.idle_timeout_seconds = secs;
    }

    Ok(config)
}

/// Initialize tracing based on configuration
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter_str = crate::logging::build_filter_directives(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    match config.format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
    }

    Ok(())
}

/// Build the identity service with the configured seed and provider accounts
pub fn build_identity_service(
    config: &KilnConfig,
) -> Result<Arc<dyn IdentityService>, Box<dyn std::error::Error>> {
    let service = InMemoryIdentityService::from_config(&config.identity)?;
    tracing::info!(
        accounts = service.account_count(),
        "Identity service ready"
    );
    Ok(Arc::new(service))
}

/// Start the synthetic feed writing into the app's history store
fn start_telemetry(
    config: &KilnConfig,
    state: &AppState,
    cancel_token: &CancellationToken,
) -> Option<FeedHandle> {
    if !config.telemetry.enabled {
        tracing::info!("Telemetry feed disabled");
        return None;
    }

    tracing::info!(
        interval_ms = config.telemetry.interval_ms,
        seed = ?config.telemetry.seed,
        "Starting synthetic telemetry feed"
    );
    let feed = SyntheticFeed::new(&config.telemetry).with_cancellation(cancel_token.clone());
    let ingestor = Arc::new(Ingestor::new(Arc::clone(&state.history)));
    Some(feed.start(ingestor.callback()))
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
        _ = cancel_token.cancelled() => {}
    }

    cancel_token.cancel();
}

/// Main serve command handler
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and merge configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Initialize tracing
    init_tracing(&config.logging)?;

    tracing::info!("Starting kiln console");
    tracing::debug!(?config, "Loaded configuration");

    // 3. Identity service and shared state
    let identity = build_identity_service(&config)?;
    let config_arc = Arc::new(config.clone());
    let app_state = Arc::new(AppState::new(config_arc, identity));
    let listener_handle = app_state.session.install_listener()?;
    let app = create_router(Arc::clone(&app_state));

    // 4. Telemetry feed
    let cancel_token = CancellationToken::new();
    let feed_handle = start_telemetry(&config, &app_state, &cancel_token);

    // 5. Bind and serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "kiln console listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    // 6. Cleanup
    if let Some(handle) = feed_handle {
        tracing::info!("Waiting for telemetry feed to stop");
        handle.stop();
        handle.join().await;
    }

    app_state.session.shutdown();
    listener_handle.await?;

    tracing::info!("kiln console stopped");
    Ok(())
}
