use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rtsp_relay::{RegistryConfig, RelayServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "rtsp-relay",
    version,
    about = "RTSP relay: one publisher per path, many subscribers, interleaved RTP over TCP"
)]
struct Args {
    /// Bind address (host:port)
    #[arg(long, short, default_value = "0.0.0.0:554")]
    bind: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_connections: usize,

    /// Close connections that send nothing for this many seconds
    #[arg(long)]
    idle_timeout_secs: Option<u64>,

    /// Cap on frames held per publisher for late joiners (default: unbounded)
    #[arg(long)]
    cache_max_frames: Option<usize>,

    /// Log filter, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServerConfig::with_addr(args.bind).max_connections(args.max_connections);
    if let Some(secs) = args.idle_timeout_secs {
        config = config.idle_timeout(Duration::from_secs(secs));
    }

    let mut registry_config = RegistryConfig::default();
    if let Some(max) = args.cache_max_frames {
        registry_config = registry_config.keyframe_cache_max_frames(max);
    }

    let server = RelayServer::with_registry_config(config, registry_config);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
