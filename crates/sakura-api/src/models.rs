// Panel domain records
//
// Inbound records (NodeInfo, UserInfo, DetectRule) are produced by the
// projection mappers in `mapping`. Outbound records (NodeStatus, OnlineUser,
// UserTraffic, IllegalItem) are built by the agent and serialized as-is by
// the request builders, so their serde names are the wire names.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Node type ────────────────────────────────────────────────────────

/// Proxy protocol the node serves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum NodeType {
    #[default]
    V2ray,
    Trojan,
    Shadowsocks,
}

// ── Inbound ──────────────────────────────────────────────────────────

/// Node configuration from `node_info`.
///
/// `node_id`, `node_type` and `enable_vless` are copied from the session,
/// everything else comes from the panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeInfo {
    pub node_type: NodeType,
    pub node_id: i64,
    pub port: u16,
    /// Bytes per second, 0 = unlimited.
    pub speed_limit: u64,
    pub alter_id: u16,
    pub transport_protocol: String,
    pub host: String,
    pub path: String,
    pub enable_tls: bool,
    pub tls_type: String,
    pub enable_vless: bool,
    pub service_name: String,
    /// Transport-specific header block, passed through untouched.
    pub header: Option<serde_json::Value>,
}

/// A user credential from `user_list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub uid: i64,
    /// String form of `uid`; the panel has no separate e-mail field.
    pub email: String,
    pub uuid: String,
    pub alter_id: u16,
    /// Bytes per second, derived from the session's Mbps limit.
    pub speed_limit: u64,
    pub device_limit: u32,
}

/// A detection pattern. Local rules carry `id == -1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectRule {
    pub id: i64,
    pub pattern: String,
}

impl DetectRule {
    /// Id given to rules that were not assigned one by the panel.
    pub const LOCAL_ID: i64 = -1;

    pub fn local(pattern: impl Into<String>) -> Self {
        Self {
            id: Self::LOCAL_ID,
            pattern: pattern.into(),
        }
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

/// Host load snapshot sent to `report_node_status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "CPU")]
    pub cpu: f64,
    #[serde(rename = "Mem")]
    pub mem: f64,
    #[serde(rename = "Disk")]
    pub disk: f64,
    /// Seconds since boot.
    #[serde(rename = "Uptime")]
    pub uptime: u64,
}

/// A connected client address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    #[serde(rename = "UID")]
    pub uid: i64,
    #[serde(rename = "IP")]
    pub ip: String,
}

/// Per-user traffic counters since the previous report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTraffic {
    #[serde(rename = "UID")]
    pub uid: i64,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Upload")]
    pub upload: i64,
    #[serde(rename = "Download")]
    pub download: i64,
}

/// A rule hit observed by the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectResult {
    pub uid: i64,
    pub rule_id: i64,
}

/// Wire shape of a rule hit for `report_illegal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IllegalItem {
    pub id: i64,
    pub uid: i64,
}

impl From<&DetectResult> for IllegalItem {
    fn from(r: &DetectResult) -> Self {
        Self {
            id: r.rule_id,
            uid: r.uid,
        }
    }
}

// ── Session description ──────────────────────────────────────────────

/// Identity of a configured client, returned by `PanelClient::describe`.
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub api_host: String,
    pub node_id: i64,
    pub key: SecretString,
    pub node_type: NodeType,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    #[test]
    fn node_type_parses_case_insensitively() {
        assert_eq!(NodeType::from_str("v2ray").ok(), Some(NodeType::V2ray));
        assert_eq!(NodeType::from_str("TROJAN").ok(), Some(NodeType::Trojan));
        assert!(NodeType::from_str("wireguard").is_err());
        assert_eq!(NodeType::Shadowsocks.to_string(), "Shadowsocks");
    }

    #[test]
    fn outbound_records_use_wire_names() {
        let status = NodeStatus {
            cpu: 1.5,
            mem: 20.0,
            disk: 3.0,
            uptime: 256,
        };
        assert_eq!(
            serde_json::to_value(status).ok(),
            Some(json!({ "CPU": 1.5, "Mem": 20.0, "Disk": 3.0, "Uptime": 256 }))
        );

        let online = OnlineUser {
            uid: 7,
            ip: "1.1.1.1".into(),
        };
        assert_eq!(
            serde_json::to_value(&online).ok(),
            Some(json!({ "UID": 7, "IP": "1.1.1.1" }))
        );
    }

    #[test]
    fn illegal_item_narrows_detect_result() {
        let hit = DetectResult { uid: 3, rule_id: 9 };
        let item = IllegalItem::from(&hit);
        assert_eq!(
            serde_json::to_value(item).ok(),
            Some(json!({ "id": 9, "uid": 3 }))
        );
    }

    #[test]
    fn client_info_debug_redacts_key() {
        let info = ClientInfo {
            api_host: "http://panel".into(),
            node_id: 1,
            key: SecretString::from("hunter2".to_string()),
            node_type: NodeType::V2ray,
        };
        assert!(!format!("{info:?}").contains("hunter2"));
    }
}
