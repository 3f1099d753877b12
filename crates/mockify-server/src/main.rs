use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mockify_server::config;
use mockify_server::observability::init_observability;
use mockify_server::server::AppState;
use mockify_server::store::InMemoryStore;
use mockify_server::transport::run_http;

/// How often expired mock records are purged
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Parser, Debug)]
#[command(name = "mockify-server")]
#[command(about = "Mock-data API with session tokens and ownership checks", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP bind host
    #[arg(long, default_value = "127.0.0.1")]
    http_host: IpAddr,

    /// HTTP bind port
    #[arg(long, default_value = "8080")]
    http_port: u16,

    /// Allowed CORS origin
    #[arg(long)]
    cors_origin: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,

    /// Send the refresh cookie without the Secure attribute (plain-HTTP development)
    #[arg(long)]
    insecure_cookie: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // CLI values are the base; file and env override them
    let mut builder = config::ConfigBuilder::new()
        .http_host(args.http_host)
        .http_port(args.http_port)
        .cors_origin(args.cors_origin)
        .json_logs(args.json_logs)
        .secure_cookie(!args.insecure_cookie);

    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }

    let builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path, builder)?
    } else {
        config::load_config(builder)?
    };

    let config = builder.build()?;

    init_observability(&config.telemetry)?;

    let store = InMemoryStore::new();
    let state = AppState::in_memory(&config, &store);

    tracing::info!("Starting Mockify server");
    tracing::info!(
        issuer = %config.jwt.issuer,
        audience = %config.jwt.audience,
        access_ttl = ?config.jwt.access_token_ttl,
        refresh_ttl = ?config.jwt.refresh_token_ttl,
        "Session tokens configured"
    );
    tracing::info!(
        frontend = %config.federated.frontend_url,
        delivery = ?config.federated.delivery,
        "Federated login configured"
    );
    tracing::info!(schemas = ?config.public.schema_ids, "Public schemas");

    let records = state.records.clone();
    let purge = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = records.purge_expired_records().await {
                tracing::error!(error = %e, "Expired record purge failed");
            }
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        tracing::info!("Shutdown signal received");
    };

    let result = run_http(state, &config.http, shutdown).await;
    purge.abort();

    result.map_err(Into::into)
}
