//! Control socket: a Unix domain socket accepting line-based `STATUS` /
//! `SHUTDOWN` / `REFRESH <worker>` commands (spec §4.10 "external control").

use crate::supervisor::Supervisor;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::{Mutex, mpsc};
use tracing::{info, warn};

/// Sent to the supervisor's main task when a `SHUTDOWN` command arrives
/// over the socket; the listener itself has no authority to tear down the
/// worker fleet.
pub struct ShutdownRequested;

pub async fn serve(
    socket_path: impl AsRef<Path>,
    supervisor: &Mutex<Supervisor>,
    shutdown_tx: mpsc::Sender<ShutdownRequested>,
) -> std::io::Result<()> {
    let path = socket_path.as_ref();
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let listener = UnixListener::bind(path)?;
    info!(path = %path.display(), "ipc socket listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "ipc connection read failed");
                continue;
            }
        };

        let response = handle_command(line.trim(), supervisor, &shutdown_tx).await;
        if let Err(e) = writer.write_all(response.as_bytes()).await {
            warn!(error = %e, "ipc response write failed");
        }
    }
}

async fn handle_command(
    command: &str,
    supervisor: &Mutex<Supervisor>,
    shutdown_tx: &mpsc::Sender<ShutdownRequested>,
) -> String {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("STATUS") => {
            let reports = supervisor.lock().await.status().await;
            let mut out = String::new();
            for r in reports {
                out.push_str(&format!(
                    "{} state={:?} processed={} errors={}\n",
                    r.name, r.status.state, r.status.messages_processed, r.status.errors
                ));
            }
            out
        }
        Some("REFRESH") => match parts.next() {
            Some(name) => {
                let ok = supervisor.lock().await.refresh_worker(name).await;
                format!("{}\n", if ok { "OK" } else { "ERR unknown worker" })
            }
            None => "ERR REFRESH requires a worker name\n".to_string(),
        },
        Some("RESTART") => match parts.next() {
            Some(name) => {
                let ok = supervisor.lock().await.restart_worker(name).await;
                format!("{}\n", if ok { "OK" } else { "ERR unknown worker" })
            }
            None => "ERR RESTART requires a worker name\n".to_string(),
        },
        Some("SHUTDOWN") => {
            let _ = shutdown_tx.send(ShutdownRequested).await;
            "OK shutting down\n".to_string()
        }
        _ => "ERR unknown command\n".to_string(),
    }
}
