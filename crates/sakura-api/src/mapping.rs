// Projection mappers
//
// Each endpoint's `datas` is decoded into a typed payload struct whose
// fields all go through the `lenient` decoders below: a missing or mistyped
// field becomes the type's zero value instead of failing the call. The
// payload is then projected into domain records together with the session
// values the panel does not send.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::models::{DetectRule, NodeInfo, NodeType, UserInfo};

/// Session values the mappers merge into panel data.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Session {
    pub node_id: i64,
    pub node_type: NodeType,
    pub enable_vless: bool,
    /// Per-user limit in Mbps.
    pub speed_limit_mbps: f64,
    pub device_limit: u32,
}

// ── Lenient field decoders ───────────────────────────────────────────

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Signed JSON integer that fits `T`, else zero.
    pub fn int<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<i64> + Default,
    {
        let v = Value::deserialize(d)?;
        Ok(v.as_i64()
            .and_then(|n| T::try_from(n).ok())
            .unwrap_or_default())
    }

    /// Non-negative JSON integer, else zero.
    pub fn uint<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        Ok(Value::deserialize(d)?.as_u64().unwrap_or_default())
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => s,
            _ => String::new(),
        })
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(Value::deserialize(d)?.as_bool().unwrap_or_default())
    }

    /// Array elements, or empty for anything else.
    pub fn array<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    /// All-string array, or empty if any element is not a string.
    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let Value::Array(items) = Value::deserialize(d)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default())
    }

    /// Any present value except `null`, untouched.
    pub fn raw<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
        Ok(Some(Value::deserialize(d)?).filter(|v| !v.is_null()))
    }
}

/// Decode a payload, falling back to the all-default payload when `datas`
/// is not an object.
fn decode<T: DeserializeOwned + Default>(datas: Value, what: &str) -> T {
    if !datas.is_object() {
        trace!(what, "datas is not an object, using defaults");
        return T::default();
    }
    serde_json::from_value(datas).unwrap_or_else(|e| {
        trace!(what, error = %e, "undecodable datas, using defaults");
        T::default()
    })
}

// ── Node info ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeInfoPayload {
    #[serde(deserialize_with = "lenient::int")]
    port: u16,
    #[serde(deserialize_with = "lenient::int")]
    alter_id: u16,
    #[serde(deserialize_with = "lenient::string")]
    transport_protocol: String,
    #[serde(deserialize_with = "lenient::boolean")]
    enable_tls: bool,
    #[serde(deserialize_with = "lenient::string")]
    tls_type: String,
    #[serde(deserialize_with = "lenient::string")]
    path: String,
    #[serde(deserialize_with = "lenient::string")]
    host: String,
    #[serde(deserialize_with = "lenient::uint")]
    speed_limit: u64,
    #[serde(deserialize_with = "lenient::string")]
    service_name: String,
    #[serde(deserialize_with = "lenient::raw")]
    header: Option<Value>,
}

/// Project `node_info` data into a [`NodeInfo`].
pub fn node_info(datas: Value, session: &Session) -> NodeInfo {
    let p: NodeInfoPayload = decode(datas, "node_info");
    NodeInfo {
        node_type: session.node_type,
        node_id: session.node_id,
        port: p.port,
        speed_limit: p.speed_limit,
        alter_id: p.alter_id,
        transport_protocol: p.transport_protocol,
        host: p.host,
        path: p.path,
        enable_tls: p.enable_tls,
        tls_type: p.tls_type,
        enable_vless: session.enable_vless,
        service_name: p.service_name,
        header: p.header,
    }
}

// ── User list ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserListPayload {
    #[serde(deserialize_with = "lenient::array")]
    user_list: Vec<Value>,
    /// Shared by every user; the panel sends no per-user value.
    #[serde(deserialize_with = "lenient::int")]
    alter_id: u16,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserEntry {
    #[serde(deserialize_with = "lenient::int")]
    port: i64,
    #[serde(deserialize_with = "lenient::string")]
    pass: String,
}

/// Convert a Mbps limit to bytes per second. Negative or NaN gives 0.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn mbps_to_bytes_per_sec(mbps: f64) -> u64 {
    (mbps * 1_000_000.0 / 8.0) as u64
}

/// Project `user_list` data into one [`UserInfo`] per panel user, in order.
pub fn user_list(datas: Value, session: &Session) -> Vec<UserInfo> {
    let p: UserListPayload = decode(datas, "user_list");
    let speed_limit = mbps_to_bytes_per_sec(session.speed_limit_mbps);

    p.user_list
        .into_iter()
        .map(|item| {
            let entry: UserEntry = decode(item, "user_list entry");
            UserInfo {
                uid: entry.port,
                email: entry.port.to_string(),
                uuid: entry.pass,
                alter_id: p.alter_id,
                speed_limit,
                device_limit: session.device_limit,
            }
        })
        .collect()
}

// ── Node rules ───────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeRulePayload {
    #[serde(deserialize_with = "lenient::strings")]
    rules: Vec<String>,
}

/// Append the panel's rules to the local list.
///
/// Local rules keep their ids and come first; panel rules are numbered from 0.
pub fn node_rules(datas: Value, local: &[DetectRule]) -> Vec<DetectRule> {
    let p: NodeRulePayload = decode(datas, "node_rule");
    let mut rules = Vec::with_capacity(local.len() + p.rules.len());
    rules.extend_from_slice(local);
    rules.extend(p.rules.into_iter().zip(0..).map(|(pattern, id)| DetectRule { id, pattern }));
    rules
}
