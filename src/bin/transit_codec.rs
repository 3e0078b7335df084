//! Transit codec CLI binary.
//!
//! Remote payload codec server for workflow-engine clients.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP codec server
//! - `compress` - Locally compress a JSON payload batch (zlib stage only)
//! - `decompress` - Locally decompress a JSON payload batch

use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use transit::codec::CompressionStage;
use transit::kms::VaultTransitClient;
use transit::payload::PayloadBatch;
use transit::server::{create_router, AppState, ServerConfig};
use transit::{OidcProvider, VERSION};

#[derive(Parser)]
#[command(name = "transit-codec")]
#[command(version = VERSION)]
#[command(about = "Remote payload codec server - encrypt and compress workflow payloads", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP codec server
    Serve {
        /// Port to listen on (env PORT overrides)
        #[arg(short, long, default_value = "8081")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Namespaces to build codec chains for
        #[arg(short, long, default_value = "default,spread", value_delimiter = ',')]
        namespaces: Vec<String>,

        /// TLS certificate file (env TLS_CERT_FILE)
        #[arg(long)]
        tls_cert_file: Option<PathBuf>,

        /// TLS certificate key file (env TLS_KEY_FILE)
        #[arg(long)]
        tls_key_file: Option<PathBuf>,

        /// OIDC provider URL. Optional: enforces oauth authentication
        #[arg(long)]
        provider: Option<String>,

        /// OIDC audience. Optional
        #[arg(long)]
        audience: Option<String>,

        /// Web UI origin. Optional: enables CORS which is required for
        /// access from the workflow-engine web UI
        #[arg(long)]
        web: Option<String>,

        /// Debug mode
        #[arg(short = 'd', long)]
        debug: bool,
    },

    /// Compress a JSON payload batch with the zlib stage (no KMS)
    Compress {
        /// JSON input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decompress a JSON payload batch with the zlib stage (no KMS)
    Decompress {
        /// JSON input (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            namespaces,
            tls_cert_file,
            tls_key_file,
            provider,
            audience,
            web,
            debug,
        } => cmd_serve(
            port,
            host,
            namespaces,
            tls_cert_file,
            tls_key_file,
            provider,
            audience,
            web,
            debug,
        ),

        Commands::Compress {
            input,
            file,
            output,
        } => cmd_compress(input, file, output),

        Commands::Decompress {
            input,
            file,
            output,
        } => cmd_decompress(input, file, output),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_serve(
    port: u16,
    host: String,
    namespaces: Vec<String>,
    tls_cert_file: Option<PathBuf>,
    tls_key_file: Option<PathBuf>,
    provider: Option<String>,
    audience: Option<String>,
    web: Option<String>,
    debug: bool,
) -> anyhow::Result<()> {
    // Initialize logging
    let log_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    // Environment fallbacks for deployment-style configuration
    let tls_cert_file = from_flag_or_env(tls_cert_file, "TLS_CERT_FILE");
    let tls_key_file = from_flag_or_env(tls_key_file, "TLS_KEY_FILE");
    let port = match std::env::var("PORT") {
        Ok(value) => value
            .parse()
            .map_err(|e| anyhow::anyhow!("error parsing PORT environment variable: {e}"))?,
        Err(_) => port,
    };

    // Build config
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let mut config = ServerConfig::default()
        .with_addr(addr)
        .with_namespaces(namespaces);

    match (tls_cert_file, tls_key_file) {
        (Some(cert), Some(key)) => config = config.with_tls(cert, key),
        (None, None) => {},
        (cert, key) => {
            // Leave the half-configured pair in place so validation
            // reports the fatal ConfigError.
            config.tls_cert_file = cert;
            config.tls_key_file = key;
        },
    }

    if let Some(issuer) = provider {
        config = config.with_oidc_issuer(issuer);
    }
    if let Some(audience) = audience {
        config = config.with_oidc_audience(audience);
    }
    if let Some(origin) = web {
        config = config.with_cors_origin(origin);
    }
    if debug {
        config = config.with_debug();
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let kms = Arc::new(VaultTransitClient::from_env()?);
    let mut state = AppState::new(config.clone(), kms)?;

    if let Some(issuer) = &config.oidc_issuer {
        let mut provider = OidcProvider::discover(issuer).await?;
        tracing::info!("oauth issuer: {}", provider.issuer());
        if let Some(audience) = &config.oidc_audience {
            provider = provider.with_audience(audience.clone());
            tracing::info!("oauth audience: {audience}");
        }
        state = state.with_authorizer(Arc::new(provider));
    }

    if let Some(origin) = &config.cors_origin {
        tracing::info!("CORS enabled for origin: {origin}");
    }

    let mut namespaces: Vec<&str> = state.registry.namespaces().collect();
    namespaces.sort_unstable();
    tracing::info!("namespaces: {}", namespaces.join(", "));

    let app = create_router(Arc::new(state))?;

    if let Some((cert, key)) = config.tls_files() {
        tracing::info!("listening on https://{}", config.addr);
        let tls = RustlsConfig::from_pem_file(cert, key).await?;
        tokio::select! {
            result = axum_server::bind_rustls(config.addr, tls).serve(app.into_make_service()) => {
                result?;
            }
            () = shutdown_signal() => {
                tracing::info!("interrupt received, shutting down");
            }
        }
    } else {
        tracing::info!("listening on http://{}", config.addr);
        let listener = tokio::net::TcpListener::bind(config.addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn cmd_compress(
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let batch: PayloadBatch = serde_json::from_str(&content)?;

    let stage = CompressionStage::new();
    let compressed = PayloadBatch::new(stage.encode(batch.payloads)?);

    write_output(output, &serde_json::to_string(&compressed)?)
}

fn cmd_decompress(
    input: Option<String>,
    file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;
    let batch: PayloadBatch = serde_json::from_str(&content)?;

    let stage = CompressionStage::new();
    let decompressed = PayloadBatch::new(stage.decode(batch.payloads)?);

    write_output(output, &serde_json::to_string(&decompressed)?)
}

// Helper functions

fn from_flag_or_env(flag: Option<PathBuf>, env_key: &str) -> Option<PathBuf> {
    flag.or_else(|| std::env::var(env_key).ok().map(PathBuf::from))
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn write_output(output: Option<PathBuf>, content: &str) -> anyhow::Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content)?;
    } else {
        println!("{content}");
    }
    Ok(())
}
