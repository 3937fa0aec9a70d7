use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::WabridgeConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "wabridge.toml",
    "wabridge.yaml",
    "wabridge.yml",
    "wabridge.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<WabridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./wabridge.{toml,yaml,yml,json}`
/// 2. `~/.config/wabridge/wabridge.{toml,yaml,yml,json}`
///
/// Returns `WabridgeConfig::default()` if no file is found or it fails to load.
pub fn discover_and_load() -> WabridgeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    WabridgeConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    find_in(Path::new(".")).or_else(|| config_dir().and_then(|dir| find_in(&dir)))
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/wabridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "wabridge").map(|d| d.config_dir().to_path_buf())
}

/// Apply the legacy environment variables on top of file values.
///
/// | variable             | field                 |
/// |----------------------|-----------------------|
/// | `PROXY_URL`          | `relay.url`           |
/// | `PORT`               | `server.port`         |
/// | `AUTO_LOGIN=1`       | `sidecar.auto_connect`|
/// | `WABRIDGE_API_TOKEN` | `server.api_token`    |
pub fn apply_env_overrides(config: WabridgeConfig) -> WabridgeConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: WabridgeConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> WabridgeConfig {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("PROXY_URL") {
        config.relay.url = Some(url);
    }
    if let Some(port) = get("PORT") {
        match port.trim().parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(e) => warn!(value = %port, error = %e, "ignoring invalid PORT"),
        }
    }
    if let Some(flag) = get("AUTO_LOGIN") {
        config.sidecar.auto_connect = flag.trim() == "1";
    }
    if let Some(token) = get("WABRIDGE_API_TOKEN") {
        config.server.api_token = Some(Secret::new(token));
    }
    config
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<WabridgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
