//! kampus - student session and record viewer
//!
#![doc = "Main entry point for the kampus application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kampus::cli::{Cli, Commands};
use kampus::commands::{self, AppContext};
use kampus::config::{Config, LoggingConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config = load_config(&cli)?;

    init_tracing(&config.logging);

    // Validate configuration
    config.validate()?;

    let ctx = AppContext::from_config(&config)?;

    // Execute command
    match cli.command {
        Commands::Login { email, password } => {
            tracing::info!("Starting login");
            commands::session::login(&ctx, &email, password).await?;
            Ok(())
        }
        Commands::Logout => {
            tracing::info!("Starting logout");
            commands::session::logout(&ctx).await?;
            Ok(())
        }
        Commands::Whoami => {
            commands::session::whoami(&ctx).await?;
            Ok(())
        }
        Commands::Profile { json } => {
            tracing::info!("Loading student record");
            commands::profile::show_profile(&ctx, json).await?;
            Ok(())
        }
        Commands::Shell => {
            tracing::info!("Starting interactive shell");
            commands::shell::run_shell(ctx).await?;
            Ok(())
        }
    }
}

/// Load configuration under a stderr subscriber
///
/// The configured log level is not known until the file is read, so loading
/// logs at `warn` (or `debug` with `--verbose`) unless `RUST_LOG` is set.
fn load_config(cli: &Cli) -> Result<Config> {
    let level = if cli.verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kampus={}", level)));
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    tracing::subscriber::with_default(bootstrap, || Config::load(config_path, cli))
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so command
/// output on stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kampus={}", logging.level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
