//! Thumbnail Server - on-demand image thumbnails with a disk cache.
//!
//! This binary starts the HTTP server or renders a single thumbnail.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thumbnail_server::{
    config::{Cli, Command, RenderConfig, ServeConfig},
    server::{create_router, route_path, RouterConfig},
    thumbnail::{FitMode, PersistOutcome, ThumbnailService},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Render(config) => run_render(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let thumbnail_config = match config.store.thumbnail_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Thumbnail Server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  App root: {}", thumbnail_config.app_root.display());
    info!("  Cache root: {}", thumbnail_config.cache_root.display());
    info!("  JPEG quality: {}", thumbnail_config.quality);
    info!("  Extensions: {}", thumbnail_config.allowed_extensions.join(", "));
    info!("  Max dimension: {}", thumbnail_config.max_dimension);
    info!("  Expires: {} day(s)", config.expires_days);

    match &config.cors_origins {
        Some(origins) if !origins.is_empty() => info!("  CORS origins: {}", origins.join(", ")),
        Some(_) => info!("  CORS: disabled"),
        None => warn!("  CORS: any origin allowed"),
    }

    let service = ThumbnailService::new(thumbnail_config);
    let router = create_router(service, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    for mode in FitMode::ALL {
        info!(
            "    curl 'http://{}{}?w=100&h=100&url=<path>'  ({})",
            addr,
            route_path(mode),
            mode
        );
    }
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "thumbnail_server=debug,tower_http=debug"
    } else {
        "thumbnail_server=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new().with_expires_days(config.expires_days);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config.with_tracing(!config.no_tracing)
}

// =============================================================================
// Render Command
// =============================================================================

async fn run_render(config: RenderConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let thumbnail_config = match config.store.thumbnail_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = ThumbnailService::new(thumbnail_config);
    let response = match service
        .get_thumbnail(
            Some(&config.width),
            Some(&config.height),
            Some(&config.source),
            config.mode,
        )
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!(kind = ?e.kind(), "Failed to render thumbnail: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Wait for the cache write so the process does not exit mid-rename.
    if let Some(pending) = response.pending_write {
        match pending.await {
            Ok(Ok(PersistOutcome::Written)) => info!("Cached thumbnail"),
            Ok(Ok(outcome)) => info!(?outcome, "Thumbnail not written to cache"),
            Ok(Err(e)) => warn!("Failed to cache thumbnail: {}", e),
            Err(e) => warn!("Cache write task failed: {}", e),
        }
    }

    if let Err(e) = tokio::fs::write(&config.output, &response.data).await {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        output = %config.output.display(),
        bytes = response.data.len(),
        cache_hit = response.cache_hit,
        mode = %response.mode,
        "Wrote thumbnail"
    );

    ExitCode::SUCCESS
}
