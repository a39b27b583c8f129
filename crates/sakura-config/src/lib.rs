//! Configuration for Sakura panel nodes.
//!
//! TOML profiles (one per node), credential resolution (env var or
//! plaintext), and translation to `sakura_api::PanelConfig`. The API crate
//! never reads files; the CLI goes through this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use sakura_api::{NodeType, PanelConfig, TlsMode, TransportConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no panel key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    NoProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is requested.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named node profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

/// Transport defaults shared by all profiles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Extra attempts after a connect/timeout failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            insecure: false,
        }
    }
}

fn default_timeout() -> u64 {
    5
}
fn default_retries() -> u32 {
    3
}

/// One node as seen by the panel.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Panel base URL (e.g. "http://127.0.0.1:8000").
    pub api_host: String,

    /// Shared panel key (plaintext; prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable holding the panel key.
    pub api_key_env: Option<String>,

    pub node_id: i64,

    /// "V2ray", "Trojan" or "Shadowsocks" (case-insensitive).
    #[serde(default = "default_node_type")]
    pub node_type: String,

    /// Per-user speed limit in Mbps, 0 = unlimited.
    #[serde(default)]
    pub speed_limit: f64,

    /// Per-user device limit, 0 = unlimited.
    #[serde(default)]
    pub device_limit: u32,

    /// Local detection rule file.
    pub rule_list_path: Option<PathBuf>,

    #[serde(default)]
    pub enable_vless: bool,

    #[serde(default)]
    pub enable_xtls: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

fn default_node_type() -> String {
    "V2ray".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "sakura", "sakura").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("sakura");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment.
///
/// Environment keys use the `SAKURA_` prefix with `__` as the nesting
/// separator, e.g. `SAKURA_PROFILES__EDGE__NODE_ID=7`. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("SAKURA_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Parse config from a TOML string, without environment overrides.
pub fn parse_config(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str))
        .extract()?;
    Ok(config)
}

/// Render config as TOML with plaintext keys masked.
pub fn render_redacted(cfg: &Config) -> Result<String, ConfigError> {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("********".into());
        }
    }
    Ok(toml::to_string_pretty(&cfg)?)
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the profile name: explicit request, then `default_profile`, then
/// `"default"`.
pub fn active_profile_name(cfg: &Config, requested: Option<&str>) -> String {
    requested
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Look up a profile by name.
pub fn profile<'a>(cfg: &'a Config, name: &str) -> Result<&'a Profile, ConfigError> {
    cfg.profiles.get(name).ok_or_else(|| ConfigError::NoProfile {
        profile: name.into(),
    })
}

/// Resolve the panel key: `api_key_env` lookup, then plaintext `api_key`.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `PanelConfig` from a profile and the global defaults.
pub fn profile_to_panel_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<PanelConfig, ConfigError> {
    let api_host: url::Url = profile
        .api_host
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "api_host".into(),
            reason: format!("invalid URL: {}", profile.api_host),
        })?;
    if !matches!(api_host.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_host".into(),
            reason: format!("expected http or https, got '{}'", api_host.scheme()),
        });
    }

    if profile.node_id <= 0 {
        return Err(ConfigError::Validation {
            field: "node_id".into(),
            reason: format!("must be positive, got {}", profile.node_id),
        });
    }

    let node_type =
        NodeType::from_str(&profile.node_type).map_err(|_| ConfigError::Validation {
            field: "node_type".into(),
            reason: format!(
                "expected 'V2ray', 'Trojan', or 'Shadowsocks', got '{}'",
                profile.node_type
            ),
        })?;

    if !profile.speed_limit.is_finite() || profile.speed_limit < 0.0 {
        return Err(ConfigError::Validation {
            field: "speed_limit".into(),
            reason: format!("must be a non-negative number, got {}", profile.speed_limit),
        });
    }

    let key = resolve_api_key(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let transport = TransportConfig {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        retries: defaults.retries,
        ..TransportConfig::default()
    };

    Ok(PanelConfig {
        api_host,
        key,
        node_id: profile.node_id,
        node_type,
        enable_vless: profile.enable_vless,
        enable_xtls: profile.enable_xtls,
        speed_limit: profile.speed_limit,
        device_limit: profile.device_limit,
        rule_list_path: profile.rule_list_path.clone(),
        transport,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "edge"

[defaults]
timeout = 10

[profiles.edge]
api_host = "https://panel.example"
api_key = "qwertyuiopasdfghjkl"
node_id = 3
node_type = "trojan"
speed_limit = 100.0
device_limit = 2
rule_list_path = "/etc/sakura/rules.txt"
"#;

    fn sample() -> Config {
        parse_config(SAMPLE).expect("sample parses")
    }

    #[test]
    fn parses_profiles_and_defaults() {
        let cfg = sample();
        assert_eq!(cfg.default_profile.as_deref(), Some("edge"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.retries, 3);
        let edge = &cfg.profiles["edge"];
        assert_eq!(edge.node_id, 3);
        assert!(!edge.enable_vless);
    }

    #[test]
    fn empty_config_has_default_profile_name() {
        let cfg = parse_config("").expect("empty parses");
        assert_eq!(active_profile_name(&cfg, None), "default");
        assert_eq!(active_profile_name(&cfg, Some("other")), "other");
        assert!(matches!(
            profile(&cfg, "default"),
            Err(ConfigError::NoProfile { .. })
        ));
    }

    #[test]
    fn profile_converts_to_panel_config() {
        let cfg = sample();
        let edge = profile(&cfg, "edge").expect("edge");

        let panel = profile_to_panel_config(edge, "edge", &cfg.defaults).expect("valid");

        assert_eq!(panel.api_host.as_str(), "https://panel.example/");
        assert_eq!(panel.key.expose_secret(), "qwertyuiopasdfghjkl");
        assert_eq!(panel.node_id, 3);
        assert_eq!(panel.node_type, NodeType::Trojan);
        assert_eq!(panel.transport.timeout, Duration::from_secs(10));
        assert!(matches!(panel.transport.tls, TlsMode::System));
        assert_eq!(
            panel.rule_list_path.as_deref(),
            Some(Path::new("/etc/sakura/rules.txt"))
        );
    }

    #[test]
    fn rejects_invalid_fields() {
        let cfg = sample();
        let base = cfg.profiles["edge"].clone();

        let cases: [(&str, fn(&mut Profile)); 4] = [
            ("api_host", |p: &mut Profile| p.api_host = "ftp://panel".into()),
            ("node_id", |p: &mut Profile| p.node_id = 0),
            ("node_type", |p: &mut Profile| p.node_type = "wireguard".into()),
            ("speed_limit", |p: &mut Profile| p.speed_limit = -1.0),
        ];

        for (field, mutate) in cases {
            let mut p = base.clone();
            mutate(&mut p);
            match profile_to_panel_config(&p, "edge", &cfg.defaults) {
                Err(ConfigError::Validation { field: got, .. }) => assert_eq!(got, field),
                other => panic!("{field}: expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_key_is_no_credentials() {
        let cfg = sample();
        let mut p = cfg.profiles["edge"].clone();
        p.api_key = None;
        p.api_key_env = Some("SAKURA_TEST_KEY_THAT_IS_NEVER_SET".into());

        assert!(matches!(
            profile_to_panel_config(&p, "edge", &cfg.defaults),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn insecure_profile_overrides_ca_cert() {
        let cfg = sample();
        let mut p = cfg.profiles["edge"].clone();
        p.ca_cert = Some("/etc/ssl/panel.pem".into());
        p.insecure = Some(true);

        let panel = profile_to_panel_config(&p, "edge", &cfg.defaults).expect("valid");
        assert!(matches!(panel.transport.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).expect("write config");

        let cfg = load_config_from(&path).expect("loads");
        assert!(cfg.profiles.contains_key("edge"));

        let missing = load_config_from(&dir.path().join("absent.toml")).expect("defaults");
        assert!(missing.profiles.is_empty());
    }

    #[test]
    fn redacted_render_masks_key() {
        let rendered = render_redacted(&sample()).expect("renders");
        assert!(!rendered.contains("qwertyuiopasdfghjkl"));
        assert!(rendered.contains("********"));
    }
}
