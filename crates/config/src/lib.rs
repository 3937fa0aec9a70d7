//! Configuration loading, env substitution and validation.
//!
//! Config files: `wabridge.toml`, `wabridge.yaml`, `wabridge.yml` or
//! `wabridge.json`, searched in `./` then `~/.config/wabridge/`.
//!
//! `${ENV_VAR}` placeholders are substituted before parsing, and the
//! legacy environment variables (`PROXY_URL`, `PORT`, `AUTO_LOGIN`,
//! `WABRIDGE_API_TOKEN`) override file values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
    },
    schema::{InboundConfig, RelayConfig, ServerConfig, SidecarConfig, WabridgeConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_str},
};
