//! `wabridge doctor`: config validation and environment audit.
//!
//! Prints a report with `[ok]`, `[warn]`, `[fail]` or `[info]` per item and
//! exits with status 1 when any check fails.

use std::{path::Path, time::Duration};

use {
    anyhow::Result,
    tokio::sync::mpsc,
    wabridge_config::{Severity, ValidationResult, WabridgeConfig, validate},
    wabridge_whatsapp::SidecarClient,
};

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const SIDECAR_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Info => CYAN,
        }
    }
}

impl From<Severity> for Status {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Fail,
            Severity::Warning => Self::Warn,
            Severity::Info => Self::Info,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}

// ── Printing ────────────────────────────────────────────────────────────────

fn print_report(sections: &[Section]) -> (usize, usize) {
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
        }
        eprintln!();
    }

    let errors = sections.iter().map(|s| s.count(Status::Fail)).sum();
    let warnings = sections.iter().map(|s| s.count(Status::Warn)).sum();
    (errors, warnings)
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn handle_doctor(config_path: Option<&Path>, config: WabridgeConfig) -> Result<()> {
    eprintln!("{BOLD}wabridge doctor{RESET}");
    eprintln!("{BOLD}==============={RESET}\n");

    let sections = vec![
        check_config(&validate(config_path)),
        check_gateway(&config),
        check_sidecar(&config).await,
    ];

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── Checks ──────────────────────────────────────────────────────────────────

fn check_config(result: &ValidationResult) -> Section {
    let label = result
        .config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    let mut section = Section::new(format!("Config ({label})"));

    if result.diagnostics.is_empty() {
        section.push(Status::Ok, "configuration valid");
        return section;
    }

    for d in &result.diagnostics {
        let message = if d.path.is_empty() {
            d.message.clone()
        } else {
            format!("{}: {}", d.path, d.message)
        };
        section.push(d.severity.into(), message);
    }

    if !result.has_errors() {
        section.push(Status::Ok, "no blocking errors");
    }
    section
}

fn check_gateway(config: &WabridgeConfig) -> Section {
    let mut section = Section::new("Gateway");
    section.push(
        Status::Info,
        format!("listening on {}:{}", config.server.bind, config.server.port),
    );
    match config.server.api_token() {
        Some(_) => section.push(Status::Ok, "bearer token required on /api"),
        None => section.push(Status::Info, "/api routes are unauthenticated"),
    }
    match config.relay.url.as_deref() {
        Some(url) => section.push(
            Status::Ok,
            format!("relaying to {url} ({}s timeout)", config.relay.timeout_secs),
        ),
        None => section.push(Status::Warn, "no relay url; set relay.url or PROXY_URL"),
    }
    section
}

async fn check_sidecar(config: &WabridgeConfig) -> Section {
    let url = config.sidecar.ws_url();
    let mut section = Section::new(format!("Sidecar ({url})"));

    if config.sidecar.manages_process() {
        section.push(
            Status::Info,
            format!("launched with `{}`", config.sidecar.command.join(" ")),
        );
        if let Some(dir) = &config.sidecar.dir
            && !dir.is_dir()
        {
            section.push(
                Status::Fail,
                format!("working directory {} does not exist", dir.display()),
            );
        }
        // Not running outside `serve`, so there is nothing to probe.
        return section;
    }

    let (events_tx, _events_rx) = mpsc::channel(1);
    let probe = tokio::time::timeout(
        SIDECAR_PROBE_TIMEOUT,
        SidecarClient::connect_with_retry(&url, events_tx, 1),
    )
    .await;
    match probe {
        Ok(Ok(_client)) => section.push(Status::Ok, "sidecar reachable"),
        Ok(Err(e)) => section.push(Status::Fail, format!("sidecar unreachable: {e}")),
        Err(_) => section.push(Status::Fail, "sidecar did not answer in time"),
    }
    section
}
