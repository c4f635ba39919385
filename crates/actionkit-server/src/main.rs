//! actionkit demo server - main entry point.
//!
//! Loads configuration, registers the demo `posts` resource and serves
//! the action endpoints.

use actionkit_core::ActionsConfig;
use actionkit_server::{demo, serve, AppState};

/// Initialize the tracing subscriber for structured logging.
///
/// Log levels can be controlled via the `RUST_LOG` environment variable:
/// - `RUST_LOG=debug` - Enable debug logs for all modules
/// - `RUST_LOG=info,actionkit_api=debug` - Debug logs for dispatch only
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let filter = EnvFilter::new("info");
        match "tower_http=debug".parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    });

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match ActionsConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            ActionsConfig::default()
        }
    };

    let services = match demo::services(config) {
        Ok(services) => services,
        Err(e) => {
            tracing::error!("Failed to set up services: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = serve(AppState::new(services)).await {
        tracing::error!("Server stopped: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
