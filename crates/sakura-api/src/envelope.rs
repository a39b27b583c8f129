// Panel response envelope
//
// Every panel endpoint answers with
// `{ "response": { "code": 200, "message": "" }, "datas": ... }`.
// Parsing stops at the first failing step and returns the `datas` subtree
// on success. What `datas` must contain is the mapper's concern.

use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{BoxError, Error};
use crate::transport::RawResponse;

/// `response.code` value meaning success.
pub const SUCCESS_CODE: i64 = 200;

/// Unwrap a transport outcome into the envelope's `datas` subtree.
///
/// Absent `datas` yields `Value::Null`.
pub fn parse(outcome: Result<RawResponse, BoxError>, path: &str) -> Result<Value, Error> {
    let response = outcome.map_err(|source| Error::Transport {
        path: path.to_owned(),
        source,
    })?;

    if response.status >= 400 {
        return Err(Error::Http {
            path: path.to_owned(),
            status: response.status,
            body: response.text(),
        });
    }

    let mut root: Value =
        serde_json::from_slice(&response.body).map_err(|e| Error::MalformedBody {
            path: path.to_owned(),
            message: e.to_string(),
            body: response.text(),
        })?;

    let code = root.pointer("/response/code").and_then(Value::as_i64);
    if code != Some(SUCCESS_CODE) {
        let message = match root.pointer("/response/message") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        debug!(path, ?code, %message, "panel rejected request");
        return Err(Error::Application {
            path: path.to_owned(),
            code,
            message,
            body: response.text(),
        });
    }

    let datas = root
        .as_object_mut()
        .and_then(|obj| obj.remove("datas"))
        .unwrap_or(Value::Null);
    trace!(path, "envelope ok");
    Ok(datas)
}
