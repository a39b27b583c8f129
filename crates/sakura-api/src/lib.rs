// sakura-api: Async Rust client for the Sakura node-management panel

pub mod client;
pub mod envelope;
pub mod error;
pub mod mapping;
pub mod models;
pub mod request;
pub mod rules;
pub mod transport;

pub use client::{PanelClient, PanelConfig};
pub use error::{BoxError, Error};
pub use models::{
    ClientInfo, DetectResult, DetectRule, IllegalItem, NodeInfo, NodeStatus, NodeType,
    OnlineUser, UserInfo, UserTraffic,
};
pub use request::PanelRequest;
pub use rules::{LocalRules, RuleLoadWarning, load_local_rules};
pub use transport::{HttpTransport, RawResponse, TlsMode, Transport, TransportConfig};
