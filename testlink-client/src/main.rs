//! testlink client: drives one back-channel session from the shell.
//!
//! ```text
//! testlink-client --port 9000 --test TestA --fixture FixtureX --result Passed < output.log
//! ```
//!
//! Runs the host's *Start* command, optionally announces a test, relays
//! every stdin line as console output, optionally reports the result and
//! finally runs *End*.

use std::path::PathBuf;

use clap::Parser;
use testlink_core::{
    ClientSession, CommandOutcome, ConsoleStream, LaunchConfiguration, PORT_KEY, TestlinkConfig,
    command,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "testlink-client", about = "Report a test run over the testlink back-channel")]
struct Cli {
    /// Listener port; stored as the "Port" launch setting.
    #[arg(short, long)]
    port: Option<String>,

    /// Extra launch settings as KEY=VALUE (repeatable).
    #[arg(long = "set", value_parser = parse_key_value)]
    settings: Vec<(String, String)>,

    /// Name of the test to announce.
    #[arg(long, requires = "fixture")]
    test: Option<String>,

    /// Fixture the test belongs to.
    #[arg(long, requires = "test")]
    fixture: Option<String>,

    /// Result to report once stdin is exhausted.
    #[arg(long, requires = "test")]
    result: Option<String>,

    /// Stack trace to attach to the result.
    #[arg(long, default_value = "", requires = "result")]
    stack_trace: String,

    /// Relay stdin lines as console errors instead of console output.
    #[arg(long)]
    stderr: bool,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "testlink.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
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

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut launch: LaunchConfiguration = cli.settings.iter().cloned().collect();
    if let Some(port) = &cli.port {
        launch.insert(PORT_KEY, port.as_str());
    }

    let mut session = ClientSession::new(config.network);
    if let CommandOutcome::Failure(message) = command::start(&mut session, &launch).await {
        error!("{message}");
        std::process::exit(1);
    }

    let outcome = relay(&mut session, &cli).await;
    command::end(&mut session).await;
    outcome?;

    info!("session complete");
    Ok(())
}

/// Announce, relay stdin, report. Any send error aborts the relay.
async fn relay(session: &mut ClientSession, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(test), Some(fixture)) = (&cli.test, &cli.fixture) {
        session.send_test_information(test, fixture).await?;
    }

    let stream = if cli.stderr {
        ConsoleStream::ConsoleError
    } else {
        ConsoleStream::ConsoleOut
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        session.send_console_message(stream, &line).await?;
    }

    if let (Some(test), Some(fixture), Some(result)) = (&cli.test, &cli.fixture, &cli.result) {
        session
            .send_test_result_information(test, fixture, result, &cli.stack_trace)
            .await?;
    }
    Ok(())
}
