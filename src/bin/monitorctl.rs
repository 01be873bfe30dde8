//! Thin CLI client for the supervisor's control socket (spec §4.10
//! "external control"): sends one line, prints whatever comes back.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::time::timeout;

#[derive(Parser, Debug)]
#[command(about = "Query or control a running canslim-monitor over its IPC socket")]
struct Cli {
    /// Path to the control socket (default: /tmp/canslim-monitor.sock).
    #[arg(long, default_value = "/tmp/canslim-monitor.sock")]
    socket: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print each worker's name, state, processed count, and error count.
    Status,
    /// Run one extra cycle of a worker immediately, outside its cadence.
    Refresh { worker: String },
    /// Tear down and respawn a worker via its registered factory.
    Restart { worker: String },
    /// Ask the monitor to stop its workers and exit.
    Shutdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let line = match &cli.command {
        Command::Status => "STATUS".to_string(),
        Command::Refresh { worker } => format!("REFRESH {worker}"),
        Command::Restart { worker } => format!("RESTART {worker}"),
        Command::Shutdown => "SHUTDOWN".to_string(),
    };

    let mut stream = UnixStream::connect(&cli.socket)
        .await
        .map_err(|e| anyhow::anyhow!("connecting to {}: {e}", cli.socket.display()))?;

    let (reader, mut writer) = stream.split();
    writer.write_all(format!("{line}\n").as_bytes()).await?;
    writer.flush().await?;

    let mut response = String::new();
    timeout(Duration::from_secs(5), BufReader::new(reader).read_to_string(&mut response))
        .await
        .map_err(|_| anyhow::anyhow!("timed out waiting for a reply"))??;

    print!("{response}");
    if response.trim_start().starts_with("ERR") {
        std::process::exit(1);
    }
    Ok(())
}
