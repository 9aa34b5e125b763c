//! apikit-mcp: MCP server for the Eolink API-management platform
//!
//! Exposes Eolink projects, API descriptors, rendered documentation and live
//! API testing to AI assistants over stdio or HTTP + SSE.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use apikit_mcp::config::{self, Overrides, TransportMode};
use apikit_mcp::eolink::{EolinkClient, Upstream};
use apikit_mcp::mcp::server::McpServer;
use apikit_mcp::mcp::{sse, ToolHandler};

/// MCP server for the Eolink API-management platform.
///
/// Lists projects and APIs, renders API documentation and sends live test
/// requests on behalf of AI assistants.
#[derive(Parser, Debug)]
#[command(name = "apikit-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,

    /// Transport to serve MCP over
    #[arg(long, env = "TRANSPORT", value_enum)]
    transport: Option<TransportMode>,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Eolink OpenAPI base URL
    #[arg(long, env = "EOLINK_BASE_URL")]
    base_url: Option<String>,

    /// Eolink API key
    #[arg(long, env = "EOLINK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            transport: self.transport,
            port: self.port,
        }
    }
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout is reserved for the stdio transport.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the apikit-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    cfg.apply_overrides(args.overrides());

    if let Err(e) = cfg.validate() {
        eprintln!("Configuration error: {e}");
        if config_path.is_none() {
            if let Some(default_path) = config::default_config_path() {
                eprintln!("\nConfig file location: {}", default_path.display());
            }
        }
        return ExitCode::FAILURE;
    }

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %cfg.upstream.base_url,
        transport = ?cfg.server.transport,
        "Starting apikit-mcp server"
    );

    let client = match EolinkClient::new(&cfg.upstream) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create upstream client");
            return ExitCode::FAILURE;
        }
    };
    let upstream: Arc<dyn Upstream> = Arc::new(client);
    let handler = Arc::new(ToolHandler::new(upstream));

    // Run the server
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(async {
        handler.warm_up().await;

        match cfg.server.transport {
            TransportMode::Stdio => {
                info!("MCP server ready, waiting for client on stdio...");
                McpServer::new(Arc::clone(&handler)).run_stdio().await
            }
            TransportMode::Http => {
                let host: IpAddr = cfg.server.host.parse().map_err(|e| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("invalid server.host '{}': {e}", cfg.server.host),
                    )
                })?;
                sse::serve(Arc::clone(&handler), SocketAddr::new(host, cfg.server.port)).await
            }
        }
    });

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
