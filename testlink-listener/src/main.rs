//! testlink listener: entry point.
//!
//! ```text
//! testlink-listener --port 9000          Log decoded messages
//! testlink-listener --port 9000 --json   Also print one JSON line per message
//! testlink-listener --gen-config         Write default config to stdout
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use testlink_core::TestlinkConfig;
use testlink_listener::server::{Listener, ListenerEvent, drain_pending};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "testlink-listener", about = "Receive testlink back-channel sessions")]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 9000)]
    port: u16,

    /// Address to bind. Defaults to `network.remote_address` from the config.
    #[arg(long)]
    bind: Option<std::net::IpAddr>,

    /// Print each message and session summary as a JSON line on stdout.
    #[arg(long)]
    json: bool,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "testlink.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&TestlinkConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = TestlinkConfig::load(&cli.config);

    // Init tracing. Logs go to stderr so stdout stays clean for --json.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("testlink-listener v{}", env!("CARGO_PKG_VERSION"));

    let ip = cli.bind.unwrap_or(config.network.remote_address);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = Listener::bind(SocketAddr::new(ip, cli.port), tx).await?;

    let run = listener.run();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(run, ctrl_c);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                if cli.json {
                    print_json(&event);
                }
            }
            result = &mut run => {
                if let Err(e) = &result {
                    error!("listener stopped: {e}");
                }
                result?;
                break;
            }
            _ = &mut ctrl_c => {
                info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    // Session tasks may have queued events the loop has not printed yet.
    for event in drain_pending(&mut rx) {
        if cli.json {
            print_json(&event);
        }
    }

    Ok(())
}

fn print_json(event: &ListenerEvent) {
    let line = match event {
        ListenerEvent::Message { peer, message } => serde_json::json!({
            "peer": peer.to_string(),
            "message": message,
        }),
        ListenerEvent::Closed { peer, transcript } => serde_json::json!({
            "peer": peer.to_string(),
            "closed": {
                "complete": transcript.is_complete(),
                "frames": transcript.frame_count(),
                "outcomes": transcript.outcomes(),
            },
        }),
    };
    println!("{line}");
}
