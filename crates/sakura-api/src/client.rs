// Panel client facade
//
// One method per panel endpoint. Each call builds a request, hands it to
// the transport, unwraps the envelope and maps `datas` into domain records.
// The client holds no mutable state besides the transport's debug flag, so
// a shared `&PanelClient` can serve concurrent callers.

use std::path::PathBuf;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::envelope;
use crate::error::Error;
use crate::mapping::{self, Session};
use crate::models::{
    ClientInfo, DetectResult, DetectRule, NodeInfo, NodeStatus, NodeType, OnlineUser, UserInfo,
    UserTraffic,
};
use crate::request::{self, PanelRequest};
use crate::rules::{LocalRules, RuleLoadWarning, load_local_rules};
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Everything needed to talk to the panel on behalf of one node.
///
/// Built by the config layer; the client never reads config files.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Panel base URL (e.g. `http://127.0.0.1:8000`).
    pub api_host: Url,
    /// Shared secret sent in the `key` header.
    pub key: SecretString,
    pub node_id: i64,
    pub node_type: NodeType,
    pub enable_vless: bool,
    pub enable_xtls: bool,
    /// Per-user speed limit in Mbps, 0 = unlimited.
    pub speed_limit: f64,
    /// Per-user device limit, 0 = unlimited.
    pub device_limit: u32,
    /// Optional local rule file, one pattern per line.
    pub rule_list_path: Option<PathBuf>,
    pub transport: TransportConfig,
}

impl PanelConfig {
    /// A V2ray node config with no limits and default transport settings.
    pub fn new(api_host: Url, key: SecretString, node_id: i64) -> Self {
        Self {
            api_host,
            key,
            node_id,
            node_type: NodeType::V2ray,
            enable_vless: false,
            enable_xtls: false,
            speed_limit: 0.0,
            device_limit: 0,
            rule_list_path: None,
            transport: TransportConfig::default(),
        }
    }
}

/// Client for one node's view of the panel.
pub struct PanelClient<T = HttpTransport> {
    transport: T,
    api_host: Url,
    key: SecretString,
    enable_xtls: bool,
    session: Session,
    local_rules: LocalRules,
}

impl PanelClient<HttpTransport> {
    /// Build a client backed by [`HttpTransport`].
    pub fn new(config: PanelConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(config.api_host.clone(), &config.key, &config.transport)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> PanelClient<T> {
    /// Build a client over any transport.
    ///
    /// Loads the local rule file once. A load failure is logged and kept
    /// available through [`local_rule_warning`](Self::local_rule_warning).
    pub fn with_transport(config: PanelConfig, transport: T) -> Self {
        let local_rules = load_local_rules(config.rule_list_path.as_deref());
        match local_rules.warning {
            Some(ref warning) => warn!("{warning}; continuing without local rules"),
            None => debug!(count = local_rules.rules.len(), "loaded local rules"),
        }

        Self {
            transport,
            api_host: config.api_host,
            key: config.key,
            enable_xtls: config.enable_xtls,
            session: Session {
                node_id: config.node_id,
                node_type: config.node_type,
                enable_vless: config.enable_vless,
                speed_limit_mbps: config.speed_limit,
                device_limit: config.device_limit,
            },
            local_rules,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn node_id(&self) -> i64 {
        self.session.node_id
    }

    pub fn node_type(&self) -> NodeType {
        self.session.node_type
    }

    pub fn enable_xtls(&self) -> bool {
        self.enable_xtls
    }

    /// Rules loaded from the local file at construction.
    pub fn local_rules(&self) -> &[DetectRule] {
        &self.local_rules.rules
    }

    /// Why the local rule file could not be read, if it could not.
    pub fn local_rule_warning(&self) -> Option<&RuleLoadWarning> {
        self.local_rules.warning.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Session identity. No network call.
    pub fn describe(&self) -> ClientInfo {
        ClientInfo {
            api_host: self.api_host.as_str().trim_end_matches('/').to_owned(),
            node_id: self.session.node_id,
            key: self.key.clone(),
            node_type: self.session.node_type,
        }
    }

    /// Turn on verbose transport logging.
    pub fn debug(&mut self) {
        self.transport.set_debug(true);
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/xray_r/node_info`
    pub async fn get_node_info(&self) -> Result<NodeInfo, Error> {
        let datas = self.call(request::node_info()).await?;
        Ok(mapping::node_info(datas, &self.session))
    }

    /// `GET /api/xray_r/user_list`
    pub async fn get_user_list(&self) -> Result<Vec<UserInfo>, Error> {
        let datas = self.call(request::user_list(self.session.node_id)).await?;
        let users = mapping::user_list(datas, &self.session);
        debug!(count = users.len(), "fetched user list");
        Ok(users)
    }

    /// `POST /api/xray_r/report_node_status`
    pub async fn report_node_status(&self, status: &NodeStatus) -> Result<(), Error> {
        let req = request::report_node_status(self.session.node_id, status)?;
        self.call(req).await?;
        Ok(())
    }

    /// `POST /api/xray_r/report_online_user`
    pub async fn report_node_online_users(&self, users: &[OnlineUser]) -> Result<(), Error> {
        let req = request::report_online_users(self.session.node_id, users)?;
        self.call(req).await?;
        Ok(())
    }

    /// `POST /api/xray_r/report_user_traffic`
    pub async fn report_user_traffic(&self, traffic: &[UserTraffic]) -> Result<(), Error> {
        let req = request::report_user_traffic(self.session.node_id, traffic)?;
        self.call(req).await?;
        Ok(())
    }

    /// `GET /api/xray_r/node_rule`
    ///
    /// Returns the local rules followed by the panel's rules. The panel
    /// list is fetched fresh on every call.
    pub async fn get_node_rule(&self) -> Result<Vec<DetectRule>, Error> {
        let datas = self.call(request::node_rule()).await?;
        let rules = mapping::node_rules(datas, &self.local_rules.rules);
        debug!(
            local = self.local_rules.rules.len(),
            total = rules.len(),
            "fetched node rules"
        );
        Ok(rules)
    }

    /// `POST /api/xray_r/report_illegal`
    pub async fn report_illegal(&self, results: &[DetectResult]) -> Result<(), Error> {
        let req = request::report_illegal(self.session.node_id, results)?;
        self.call(req).await?;
        Ok(())
    }

    async fn call(&self, req: PanelRequest) -> Result<Value, Error> {
        let outcome = self.transport.send(&req).await;
        envelope::parse(outcome, req.path)
    }
}
