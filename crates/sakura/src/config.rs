//! CLI-side config resolution: config file profile plus flag overrides.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use sakura_api::{NodeType, PanelConfig};
use sakura_config::{Config, Defaults};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Path of the config file in effect.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(sakura_config::config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(sakura_config::load_config_from(&config_path(global))?)
}

/// Build a `PanelConfig` from the active profile, then apply flag overrides.
///
/// Without a matching profile, `--api-host`, `--key` and `--node-id` must
/// all be given.
pub fn resolve(global: &GlobalOpts) -> Result<PanelConfig, CliError> {
    let cfg = load(global)?;
    let profile_name = sakura_config::active_profile_name(&cfg, global.profile.as_deref());

    let mut panel = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            sakura_config::profile_to_panel_config(profile, &profile_name, &cfg.defaults)?
        }
        None if global.profile.is_some() => {
            return Err(sakura_config::ConfigError::NoProfile {
                profile: profile_name,
            }
            .into());
        }
        None => from_flags(global, &cfg.defaults)?,
    };

    apply_overrides(&mut panel, global)?;
    if panel.node_id <= 0 {
        return Err(CliError::Validation {
            field: "node-id".into(),
            reason: format!("must be positive, got {}", panel.node_id),
        });
    }
    Ok(panel)
}

fn from_flags(global: &GlobalOpts, defaults: &Defaults) -> Result<PanelConfig, CliError> {
    let (Some(host), Some(key), Some(node_id)) = (&global.api_host, &global.key, global.node_id)
    else {
        return Err(CliError::NoConfig {
            path: config_path(global).display().to_string(),
        });
    };

    let mut panel = PanelConfig::new(
        parse_host(host)?,
        SecretString::from(key.clone()),
        node_id,
    );
    panel.transport.timeout = Duration::from_secs(defaults.timeout);
    panel.transport.retries = defaults.retries;
    Ok(panel)
}

fn apply_overrides(panel: &mut PanelConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref host) = global.api_host {
        panel.api_host = parse_host(host)?;
    }
    if let Some(ref key) = global.key {
        panel.key = SecretString::from(key.clone());
    }
    if let Some(node_id) = global.node_id {
        panel.node_id = node_id;
    }
    if let Some(ref node_type) = global.node_type {
        panel.node_type = node_type.parse::<NodeType>().map_err(|_| CliError::Validation {
            field: "node-type".into(),
            reason: format!("expected V2ray, Trojan or Shadowsocks, got '{node_type}'"),
        })?;
    }
    if let Some(timeout) = global.timeout {
        panel.transport.timeout = Duration::from_secs(timeout);
    }
    Ok(())
}

fn parse_host(host: &str) -> Result<url::Url, CliError> {
    host.parse().map_err(|_| CliError::Validation {
        field: "api-host".into(),
        reason: format!("invalid URL: {host}"),
    })
}
