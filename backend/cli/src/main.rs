mod doctor_cmd;
mod provider;
mod status_cmd;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use tripforge_agent::{spawn_reaper, FlowController, InMemorySessionStore, SessionStore};
use tripforge_config::{validate, TripForgeConfig};
use tripforge_gateway::{build_router, start_server, GatewayState};
use tripforge_logging::init_logger;

#[derive(Parser)]
#[command(name = "tripforge")]
#[command(about = "TripForge: conversational travel itinerary planner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TripForge HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Query a running server's health endpoint
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check the environment configuration
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = TripForgeConfig::from_env();

    match cli.command {
        Commands::Serve { port, bind } => {
            let mut config = loaded?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            init_logger(&config.logging.level, config.logging.dir.as_deref());
            run_server(config).await?;
        }
        Commands::Status { port } => {
            let config = loaded?;
            let port = port.unwrap_or(config.server.port);
            status_cmd::run(&config.server.bind, port).await?;
        }
        Commands::Doctor => {
            if !doctor_cmd::run(&loaded)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_server(config: TripForgeConfig) -> Result<()> {
    let report = validate(&config);
    report.log();
    if !report.is_valid() {
        bail!(
            "invalid configuration ({} error(s)); run `tripforge doctor` for details",
            report.errors.len()
        );
    }

    info!(
        addr = %config.server.addr(),
        provider = %config.llm.provider,
        model = %config.llm.effective_model(),
        config = %config.redacted(),
        "Starting TripForge"
    );

    let llm = provider::build_provider(&config.llm)?;
    let policy = provider::build_policy(&config.llm);

    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let controller = Arc::new(FlowController::with_provider(Arc::clone(&store), llm, policy));

    let reaper = config.server.session_idle_secs.map(|secs| {
        info!(idle_secs = secs, "Idle session eviction enabled");
        spawn_reaper(Arc::clone(&store), Duration::from_secs(secs))
    });

    let addr: SocketAddr = config
        .server
        .addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.addr()))?;

    let app = build_router(GatewayState::new(controller))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let result = start_server(addr, app).await;

    if let Some(reaper) = reaper {
        reaper.abort();
    }
    result
}
