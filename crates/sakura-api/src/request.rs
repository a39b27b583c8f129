// Panel request builders
//
// One builder per endpoint. Builders are pure: they turn typed records and
// the node id into a `PanelRequest` and never touch the network.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::models::{DetectResult, IllegalItem, NodeStatus, OnlineUser, UserTraffic};

// ── Endpoint paths ───────────────────────────────────────────────────

pub const NODE_INFO_PATH: &str = "/api/xray_r/node_info";
pub const USER_LIST_PATH: &str = "/api/xray_r/user_list";
pub const REPORT_NODE_STATUS_PATH: &str = "/api/xray_r/report_node_status";
pub const REPORT_ONLINE_USER_PATH: &str = "/api/xray_r/report_online_user";
pub const REPORT_USER_TRAFFIC_PATH: &str = "/api/xray_r/report_user_traffic";
pub const NODE_RULE_PATH: &str = "/api/xray_r/node_rule";
pub const REPORT_ILLEGAL_PATH: &str = "/api/xray_r/report_illegal";

/// Query parameter naming the reporting node.
pub const NODE_ID_PARAM: &str = "node_id";

/// A transport-independent panel request.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRequest {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl PanelRequest {
    fn get(path: &'static str) -> Self {
        Self {
            method: Method::GET,
            path,
            query: Vec::new(),
            body: None,
        }
    }

    fn post(path: &'static str, body: &impl Serialize) -> Result<Self, Error> {
        Ok(Self {
            method: Method::POST,
            path,
            query: Vec::new(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    fn node_scoped(mut self, node_id: i64) -> Self {
        self.query.push((NODE_ID_PARAM, node_id.to_string()));
        self
    }

    /// Value of a query parameter, if set.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

// ── Builders ─────────────────────────────────────────────────────────

/// `GET /api/xray_r/node_info`
pub fn node_info() -> PanelRequest {
    PanelRequest::get(NODE_INFO_PATH)
}

/// `GET /api/xray_r/user_list?node_id=`
pub fn user_list(node_id: i64) -> PanelRequest {
    PanelRequest::get(USER_LIST_PATH).node_scoped(node_id)
}

/// `GET /api/xray_r/node_rule`
pub fn node_rule() -> PanelRequest {
    PanelRequest::get(NODE_RULE_PATH)
}

/// `POST /api/xray_r/report_node_status?node_id=`
pub fn report_node_status(node_id: i64, status: &NodeStatus) -> Result<PanelRequest, Error> {
    Ok(PanelRequest::post(REPORT_NODE_STATUS_PATH, status)?.node_scoped(node_id))
}

/// `POST /api/xray_r/report_online_user?node_id=`
pub fn report_online_users(node_id: i64, users: &[OnlineUser]) -> Result<PanelRequest, Error> {
    Ok(PanelRequest::post(REPORT_ONLINE_USER_PATH, &users)?.node_scoped(node_id))
}

/// `POST /api/xray_r/report_user_traffic?node_id=`
pub fn report_user_traffic(
    node_id: i64,
    traffic: &[UserTraffic],
) -> Result<PanelRequest, Error> {
    Ok(PanelRequest::post(REPORT_USER_TRAFFIC_PATH, &traffic)?.node_scoped(node_id))
}

/// `POST /api/xray_r/report_illegal?node_id=`
///
/// Each hit is narrowed to `{id, uid}` before serialization.
pub fn report_illegal(node_id: i64, results: &[DetectResult]) -> Result<PanelRequest, Error> {
    let items: Vec<IllegalItem> = results.iter().map(IllegalItem::from).collect();
    Ok(PanelRequest::post(REPORT_ILLEGAL_PATH, &items)?.node_scoped(node_id))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn get_requests_have_no_body() {
        let req = node_info();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, NODE_INFO_PATH);
        assert!(req.query.is_empty());
        assert!(req.body.is_none());

        assert!(node_rule().query.is_empty());
    }

    #[test]
    fn user_list_is_node_scoped() {
        let req = user_list(42);
        assert_eq!(req.path, USER_LIST_PATH);
        assert_eq!(req.query_param(NODE_ID_PARAM), Some("42"));
    }

    #[test]
    fn node_status_body_is_the_record() {
        let status = NodeStatus {
            cpu: 1.0,
            mem: 1.0,
            disk: 1.0,
            uptime: 256,
        };
        let req = report_node_status(1, &status).expect("serializable");

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.query_param(NODE_ID_PARAM), Some("1"));
        assert_eq!(
            req.body,
            Some(json!({ "CPU": 1.0, "Mem": 1.0, "Disk": 1.0, "Uptime": 256 }))
        );
    }

    #[test]
    fn traffic_body_is_a_list() {
        let traffic = [UserTraffic {
            uid: 1,
            email: "1".into(),
            upload: 100,
            download: 200,
        }];
        let req = report_user_traffic(3, &traffic).expect("serializable");
        assert_eq!(req.path, REPORT_USER_TRAFFIC_PATH);
        assert_eq!(
            req.body,
            Some(json!([{ "UID": 1, "Email": "1", "Upload": 100, "Download": 200 }]))
        );
    }

    #[test]
    fn empty_online_list_still_sends_array() {
        let req = report_online_users(3, &[]).expect("serializable");
        assert_eq!(req.body, Some(json!([])));
    }

    #[test]
    fn illegal_report_uses_narrow_wire_shape() {
        let hits = [
            DetectResult { uid: 10, rule_id: 2 },
            DetectResult { uid: 11, rule_id: -1 },
        ];
        let req = report_illegal(5, &hits).expect("serializable");
        assert_eq!(req.path, REPORT_ILLEGAL_PATH);
        assert_eq!(req.query_param(NODE_ID_PARAM), Some("5"));
        assert_eq!(
            req.body,
            Some(json!([{ "id": 2, "uid": 10 }, { "id": -1, "uid": 11 }]))
        );
    }
}
