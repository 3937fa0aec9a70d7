//! Configuration validation.
//!
//! Detects syntax errors, unknown or misspelled fields, type errors and
//! settings that will not behave as the operator probably expects.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use serde_json::Value;

use crate::{env_subst::substitute_env, schema::WabridgeConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// "syntax", "unknown-field", "type-error", "security" or "value"
    pub category: &'static str,
    /// Dotted path, e.g. "relay.url"
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Known keys per section, mirroring `schema.rs`.
const SECTIONS: &[(&str, &[&str])] = &[
    ("server", &["bind", "port", "api_token"]),
    ("relay", &["url", "timeout_secs"]),
    ("inbound", &["group_handling", "maps_base_url", "history_capacity"]),
    ("sidecar", &[
        "url",
        "port",
        "command",
        "dir",
        "auto_connect",
        "connect_attempts",
    ]),
];

/// Validate the config file at `path`, or the discovered one when `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        return ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Info,
                category: "syntax",
                path: String::new(),
                message: "no config file found; using defaults".into(),
            }],
            config_path: None,
        };
    };

    let ext = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("toml")
        .to_string();
    let mut result = match std::fs::read_to_string(&actual_path) {
        Ok(content) => validate_str(&substitute_env(&content), &ext),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("failed to read config file: {e}"),
            }],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate raw config text in the format named by `ext`.
#[must_use]
pub fn validate_str(raw: &str, ext: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value = match parse_value(raw, ext) {
        Ok(v) => v,
        Err(message) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message,
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &mut diagnostics);

    match serde_json::from_value::<WabridgeConfig>(value) {
        Ok(config) => check_semantics(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn parse_value(raw: &str, ext: &str) -> Result<Value, String> {
    match ext {
        "toml" => toml::from_str::<toml::Value>(raw)
            .map_err(|e| format!("TOML syntax error: {e}"))
            .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string())),
        "yaml" | "yml" => {
            // An empty YAML document parses as null; treat it as an empty table.
            let v: serde_yaml::Value =
                serde_yaml::from_str(raw).map_err(|e| format!("YAML syntax error: {e}"))?;
            match v {
                serde_yaml::Value::Null => Ok(Value::Object(Default::default())),
                v => serde_json::to_value(v).map_err(|e| e.to_string()),
            }
        },
        "json" => serde_json::from_str(raw).map_err(|e| format!("JSON syntax error: {e}")),
        other => Err(format!("unsupported config format: .{other}")),
    }
}

fn check_unknown_fields(value: &Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = value.as_object() else {
        return;
    };
    let section_names: Vec<&str> = SECTIONS.iter().map(|(name, _)| *name).collect();

    for (key, child) in root {
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| key == name) else {
            diagnostics.push(unknown_field(key.clone(), key, &section_names, true));
            continue;
        };
        let Some(table) = child.as_object() else {
            continue;
        };
        for field in table.keys() {
            if !fields.contains(&field.as_str()) {
                diagnostics.push(unknown_field(format!("{key}.{field}"), field, fields, false));
            }
        }
    }
}

fn unknown_field(path: String, key: &str, candidates: &[&str], top_level: bool) -> Diagnostic {
    let level = if top_level {
        "unknown field at top level"
    } else {
        "unknown field"
    };
    let message = match suggest(key, candidates, 3) {
        Some(s) => format!("{level} (did you mean \"{s}\"?)"),
        None => level.to_string(),
    };
    Diagnostic {
        severity: Severity::Error,
        category: "unknown-field",
        path,
        message,
    }
}

fn check_semantics(config: &WabridgeConfig, diagnostics: &mut Vec<Diagnostic>) {
    let mut push = |severity, category, path: &str, message: String| {
        diagnostics.push(Diagnostic {
            severity,
            category,
            path: path.into(),
            message,
        });
    };

    match config.relay.url.as_deref().map(str::trim) {
        None | Some("") => push(
            Severity::Warning,
            "value",
            "relay.url",
            "no relay endpoint configured; inbound messages will not be forwarded".into(),
        ),
        Some(url) if !is_http(url) => push(
            Severity::Error,
            "value",
            "relay.url",
            format!("relay endpoint must be an http(s) URL, got \"{url}\""),
        ),
        Some(_) => {},
    }

    if config.relay.timeout_secs == 0 {
        push(
            Severity::Error,
            "value",
            "relay.timeout_secs",
            "relay timeout must be greater than zero".into(),
        );
    }

    if !is_http(&config.inbound.maps_base_url) {
        push(
            Severity::Warning,
            "value",
            "inbound.maps_base_url",
            format!(
                "maps base URL \"{}\" is not an http(s) URL",
                config.inbound.maps_base_url
            ),
        );
    }

    if config.inbound.history_capacity == 0 {
        push(
            Severity::Warning,
            "value",
            "inbound.history_capacity",
            "history capacity 0 is raised to 1".into(),
        );
    }

    let ws_url = config.sidecar.ws_url();
    if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
        push(
            Severity::Error,
            "value",
            "sidecar.url",
            format!("sidecar URL must use ws:// or wss://, got \"{ws_url}\""),
        );
    }

    if config.sidecar.connect_attempts == 0 {
        push(
            Severity::Error,
            "value",
            "sidecar.connect_attempts",
            "at least one connection attempt is required".into(),
        );
    }

    if config.server.port == 0 {
        push(
            Severity::Info,
            "value",
            "server.port",
            "port 0 binds a random free port".into(),
        );
    }

    let is_localhost = matches!(config.server.bind.as_str(), "127.0.0.1" | "localhost" | "::1");
    if !is_localhost && config.server.api_token().is_none() {
        push(
            Severity::Warning,
            "security",
            "server.api_token",
            format!(
                "send API is unauthenticated while binding to {}",
                config.server.bind
            ),
        );
    }
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Levenshtein edit distance.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const VALID: &str = r#"
[server]
bind = "127.0.0.1"
port = 3000

[relay]
url = "https://hooks.example.com/wa"
timeout_secs = 10

[inbound]
group_handling = true

[sidecar]
port = 7778
"#;

    fn find<'a>(result: &'a ValidationResult, path: &str) -> Option<&'a Diagnostic> {
        result.diagnostics.iter().find(|d| d.path == path)
    }

    #[rstest]
    #[case("", "", 0)]
    #[case("abc", "", 3)]
    #[case("server", "sever", 1)]
    #[case("relay", "realy", 2)]
    #[case("cat", "car", 1)]
    fn edit_distance(#[case] a: &str, #[case] b: &str, #[case] expected: usize) {
        assert_eq!(levenshtein(a, b), expected);
    }

    #[test]
    fn valid_config_is_clean() {
        let result = validate_str(VALID, "toml");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn unknown_top_level_key_with_suggestion() {
        let result = validate_str("[sever]\nport = 1\n", "toml");
        let d = find(&result, "sever").unwrap();
        assert_eq!(d.severity, Severity::Error);
        assert!(d.message.contains("server"), "{}", d.message);
    }

    #[test]
    fn unknown_nested_key_with_suggestion() {
        let result = validate_str("[relay]\nurll = \"https://x\"\n", "toml");
        let d = find(&result, "relay.urll").unwrap();
        assert_eq!(d.category, "unknown-field");
        assert!(d.message.contains("\"url\""));
    }

    #[test]
    fn syntax_error_stops_early() {
        let result = validate_str("[server\n", "toml");
        assert!(result.has_errors());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, "syntax");
    }

    #[test]
    fn type_error_reported() {
        let result = validate_str("[server]\nport = \"http\"\n", "toml");
        assert!(result.diagnostics.iter().any(|d| d.category == "type-error"));
    }

    #[test]
    fn missing_relay_is_a_warning() {
        let result = validate_str("", "toml");
        let d = find(&result, "relay.url").unwrap();
        assert_eq!(d.severity, Severity::Warning);
        assert!(!result.has_errors());
    }

    #[rstest]
    #[case("[relay]\nurl = \"ftp://x\"\n", "relay.url")]
    #[case("[relay]\nurl = \"https://x\"\ntimeout_secs = 0\n", "relay.timeout_secs")]
    #[case("[relay]\nurl = \"https://x\"\n[sidecar]\nurl = \"http://x\"\n", "sidecar.url")]
    #[case(
        "[relay]\nurl = \"https://x\"\n[sidecar]\nconnect_attempts = 0\n",
        "sidecar.connect_attempts"
    )]
    fn invalid_values_are_errors(#[case] raw: &str, #[case] path: &str) {
        let result = validate_str(raw, "toml");
        let d = find(&result, path).unwrap();
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn public_bind_without_token_warned() {
        let raw = "[server]\nbind = \"0.0.0.0\"\n[relay]\nurl = \"https://x\"\n";
        let result = validate_str(raw, "toml");
        let d = find(&result, "server.api_token").unwrap();
        assert_eq!(d.category, "security");

        let raw = "[server]\nbind = \"0.0.0.0\"\napi_token = \"t\"\n[relay]\nurl = \"https://x\"\n";
        assert!(find(&validate_str(raw, "toml"), "server.api_token").is_none());
    }

    #[test]
    fn yaml_and_json_are_checked() {
        let result = validate_str("relay:\n  url: https://x\n  timeot_secs: 3\n", "yaml");
        assert!(find(&result, "relay.timeot_secs").is_some());

        let result = validate_str(r#"{"relay": {"url": "https://x"}}"#, "json");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let result = validate_str("", "yaml");
        assert!(!result.has_errors());
    }

    #[test]
    fn validates_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wabridge.toml");
        std::fs::write(&path, VALID).unwrap();
        let result = validate(Some(&path));
        assert_eq!(result.config_path.as_deref(), Some(path.as_path()));
        assert_eq!(result.count(Severity::Error), 0);

        let missing = validate(Some(&dir.path().join("missing.toml")));
        assert!(missing.has_errors());
    }
}
