use anyhow::Context;
use clap::{Parser, ValueEnum};
use rmcp::{ServiceExt, transport::stdio};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use whodb_core::config::ConfigStore;
use whodb_core::manager::ConnectionManager;
use whodb_mcp_server::rate_limit::RateLimiter;
use whodb_mcp_server::{
    PermissionMode, ServerOptions, ServerState, ValidatorLevel, WhodbMcpServer, http, registry,
};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Transport {
    /// Framed messages over stdin/stdout.
    #[default]
    Stdio,
    /// Streaming HTTP at /mcp with a health endpoint and rate limiting.
    Http,
}

/// MCP query server for WhoDB-managed databases.
#[derive(Parser, Debug)]
#[command(name = "whodb-mcp", version, about)]
struct Args {
    /// Transport mode.
    #[arg(short, long, value_enum, default_value = "stdio")]
    transport: Transport,

    /// Path to the saved-connections JSON file. Omit to rely on
    /// environment profiles only.
    #[arg(short, long)]
    config: Option<String>,

    /// Write policy.
    #[arg(long, value_enum, default_value = "confirm-writes")]
    permission_mode: PermissionMode,

    /// SQL validator level (safe-mode forces strict).
    #[arg(long, value_enum, default_value = "standard")]
    validator: ValidatorLevel,

    /// Allow DROP/TRUNCATE (in addition to the write policy).
    #[arg(long)]
    allow_drop: bool,

    /// Allow multiple statements per query.
    #[arg(long)]
    allow_multi_statement: bool,

    /// Per-query timeout in seconds.
    #[arg(long, default_value = "30")]
    query_timeout_secs: u64,

    /// Maximum rows returned per query.
    #[arg(long, default_value = "500")]
    row_limit: usize,

    /// Confirmation token lifetime in seconds.
    #[arg(long, default_value = "300")]
    confirmation_ttl_secs: u64,

    // --- HTTP transport options ---
    /// Host to bind the HTTP server.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the HTTP server.
    #[arg(long, default_value = "8170")]
    port: u16,

    /// Token-bucket refill rate per client IP.
    #[arg(long, default_value = "5")]
    qps: f64,

    /// Daily request cap per client IP.
    #[arg(long, default_value = "10000")]
    daily_limit: u64,

    /// Secret for the X-RateLimit-Bypass header.
    #[arg(long, env = "WHODB_MCP_BYPASS_TOKEN")]
    bypass_token: Option<String>,
}

impl Args {
    fn options(&self) -> ServerOptions {
        ServerOptions {
            permission_mode: self.permission_mode,
            validator: self.validator,
            allow_drop: self.allow_drop,
            allow_multi_statement: self.allow_multi_statement,
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            row_limit: self.row_limit,
            confirmation_ttl: Duration::from_secs(self.confirmation_ttl_secs),
            qps: self.qps,
            daily_limit: self.daily_limit,
            bypass_token: self.bypass_token.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    env_logger::init();

    if let Err(e) = run(args).await {
        log::error!("[STARTUP] {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ConfigStore::load(path).context("loading connection config")?,
        None => ConfigStore::in_memory(),
    };

    let engine = Arc::new(registry::build_engine());
    let manager = ConnectionManager::new(engine, Arc::new(config));
    let options = args.options();
    let state = Arc::new(ServerState::new(manager, options.clone()));

    match args.transport {
        Transport::Stdio => run_stdio(state).await,
        Transport::Http => run_http(state, &options, &args.host, args.port).await,
    }
}

async fn run_stdio(state: Arc<ServerState>) -> anyhow::Result<()> {
    log::info!("[STARTUP] serving MCP over stdio");
    let service = WhodbMcpServer::new(state)
        .serve(stdio())
        .await
        .context("starting stdio transport")?;

    tokio::select! {
        result = service.waiting() => {
            result.context("stdio transport stopped")?;
        }
        _ = shutdown_signal() => {
            log::info!("[SHUTDOWN] signal received, draining in-flight calls");
        }
    }
    Ok(())
}

async fn run_http(
    state: Arc<ServerState>,
    options: &ServerOptions,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let limiter = Arc::new(RateLimiter::new(
        options.qps,
        options.daily_limit,
        options.bypass_token.clone(),
    ));
    let router = http::router(state, limiter);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parsing bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    log::info!("[STARTUP] serving MCP over HTTP at http://{addr}/mcp");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("http server stopped")?;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                log::error!("[SHUTDOWN] failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
