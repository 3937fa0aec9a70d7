//! Supervision of a locally launched sidecar process.

use std::{path::PathBuf, process::Stdio, time::Duration};

use {
    anyhow::{Context, Result, bail},
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        process::{Child, Command},
    },
    tracing::{debug, error, info, warn},
    wabridge_protocol::DEFAULT_SIDECAR_PORT,
};

/// Environment variable carrying the WebSocket port to the sidecar.
pub const PORT_ENV: &str = "WABRIDGE_SIDECAR_PORT";

const STARTUP_GRACE: Duration = Duration::from_millis(500);
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// How to launch the sidecar.
#[derive(Debug, Clone)]
pub struct SidecarConfig {
    /// Program and arguments, e.g. `["node", "dist/index.js"]`.
    pub command: Vec<String>,
    pub dir: Option<PathBuf>,
    pub port: u16,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            command: vec!["node".into(), "dist/index.js".into()],
            dir: None,
            port: DEFAULT_SIDECAR_PORT,
        }
    }
}

/// Handle to a running sidecar process.
pub struct SidecarProcess {
    child: Child,
    port: u16,
}

impl SidecarProcess {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// SIGTERM, then kill if the process is still alive after five seconds.
    pub async fn stop(&mut self) -> Result<()> {
        info!("stopping whatsapp sidecar process");

        #[cfg(unix)]
        {
            use nix::{
                sys::signal::{Signal, kill},
                unistd::Pid,
            };

            if let Some(pid) = self.child.id()
                && let Ok(pid) = i32::try_from(pid)
            {
                let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = self.child.kill().await;
        }

        match tokio::time::timeout(STOP_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(?status, "whatsapp sidecar process exited");
            },
            Ok(Err(e)) => {
                warn!(error = %e, "error waiting for sidecar process");
            },
            Err(_) => {
                warn!("sidecar process did not exit gracefully, killing");
                let _ = self.child.kill().await;
            },
        }

        Ok(())
    }
}

impl Drop for SidecarProcess {
    fn drop(&mut self) {
        if let Some(pid) = self.child.id() {
            debug!(pid, "dropping sidecar process handle");
        }
    }
}

/// Spawn the sidecar and forward its output to `tracing`.
pub async fn start_sidecar(config: SidecarConfig) -> Result<SidecarProcess> {
    let Some((program, args)) = config.command.split_first() else {
        bail!("sidecar command is empty");
    };

    info!(
        program,
        dir = ?config.dir,
        port = config.port,
        "starting whatsapp sidecar process"
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env(PORT_ENV, config.port.to_string())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &config.dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn sidecar process `{program}`"))?;

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log_sidecar_line(&line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(target: "wabridge_sidecar", "{}", line);
            }
        });
    }

    tokio::time::sleep(STARTUP_GRACE).await;

    match child.try_wait() {
        Ok(Some(status)) => {
            bail!("sidecar process exited immediately with status: {status}");
        },
        Ok(None) => {},
        Err(e) => {
            bail!("failed to check sidecar process status: {e}");
        },
    }

    info!(port = config.port, "whatsapp sidecar process started");

    Ok(SidecarProcess {
        child,
        port: config.port,
    })
}

/// Pino JSON lines keep their level; anything else is logged as info.
fn log_sidecar_line(line: &str) {
    if line.starts_with('{')
        && let Ok(log) = serde_json::from_str::<serde_json::Value>(line)
    {
        let level = log
            .get("level")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(30);
        let msg = log
            .get("msg")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(line);
        match level {
            10 | 20 => debug!(target: "wabridge_sidecar", "{}", msg),
            30 => info!(target: "wabridge_sidecar", "{}", msg),
            40 => warn!(target: "wabridge_sidecar", "{}", msg),
            _ => error!(target: "wabridge_sidecar", "{}", msg),
        }
        return;
    }
    info!(target: "wabridge_sidecar", "{}", line);
}
