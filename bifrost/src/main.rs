use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bifrost::cli::Cli;
use bifrost::config::{Config, ConfigError};
use bifrost::schema;
use bifrost::server::{self, AppState};
use bifrost_mediawiki::{ApiClient, Gateway};

/// Fatal startup failures; any of these exits the process non-zero.
#[derive(Debug, thiserror::Error)]
enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(not(feature = "plebiscite"))]
    #[error("PLEBISCITE is set but this build does not include the plebiscite feature")]
    PlebisciteUnavailable,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::new(&config.log_level);
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_schema(config: &Config, gateway: Gateway) -> Result<schema::AppSchema, BootstrapError> {
    match &config.plebiscite {
        None => Ok(schema::build_schema(gateway)),
        #[cfg(feature = "plebiscite")]
        Some(plebiscite) => {
            let datasource = bifrost::plebiscite::Plebiscite::new(plebiscite.clone());
            Ok(schema::build_schema_with_plebiscite(gateway, datasource))
        }
        #[cfg(not(feature = "plebiscite"))]
        Some(_) => Err(BootstrapError::PlebisciteUnavailable),
    }
}

#[tokio::main]
async fn main() -> Result<(), BootstrapError> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    config.apply_cli(&cli);
    init_tracing(&config);

    let client = ApiClient::builder().ttl(config.cache_ttl).build();
    let gateway = Gateway::new(client);
    let schema = build_schema(&config, gateway)?;

    let state = AppState::new(schema, config.debug_requests);
    let router = server::router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %config.bind_addr(),
        ttl_ms = config.cache_ttl.as_millis() as u64,
        erowid = config.plebiscite.is_some(),
        "bifrost listening"
    );
    axum::serve(listener, router).await?;
    Ok(())
}
