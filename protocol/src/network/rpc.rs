//! # JSON-RPC Wire Types
//!
//! Request and response envelopes for the Substrate JSON-RPC API, limited
//! to the read-only methods the query layer issues.
//!
//! ## Method Index
//!
//! | Method                 | Params                       | Result                 |
//! |------------------------|------------------------------|------------------------|
//! | `system_health`        | none                         | `SystemHealth`         |
//! | `state_getStorage`     | `(key)`                      | hex data or `null`     |
//! | `state_getKeysPaged`   | `(prefix, count, start_key)` | `[key]`                |
//! | `state_queryStorageAt` | `([key])`                    | `[StorageChangeSet]`   |
//!
//! Every method is evaluated at the node's best block when no block hash is
//! passed, which is what the client wants.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Read-only methods used against the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "system_health")]
    SystemHealth,
    #[serde(rename = "state_getStorage")]
    GetStorage,
    #[serde(rename = "state_getKeysPaged")]
    GetKeysPaged,
    #[serde(rename = "state_queryStorageAt")]
    QueryStorageAt,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::SystemHealth => "system_health",
            RpcMethod::GetStorage => "state_getStorage",
            RpcMethod::GetKeysPaged => "state_getKeysPaged",
            RpcMethod::QueryStorageAt => "state_queryStorageAt",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: RpcMethod,
    pub params: serde_json::Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: RpcMethod, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// `result` stays an untyped value here: for `state_getStorage` a `null`
/// result is a legitimate "no such key" and must not be confused with a
/// missing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result,
            error: None,
        }
    }

    pub fn error(id: u64, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            result: serde_json::Value::Null,
            error: Some(error),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object.
///
/// - `-32700`: Parse error
/// - `-32600`: Invalid request
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("method not found: {}", method.into()),
            data: None,
        }
    }

    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: msg.into(),
            data: None,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

// ---------------------------------------------------------------------------
// Typed Response Payloads
// ---------------------------------------------------------------------------

/// Result of `system_health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub peers: u64,
    pub is_syncing: bool,
    pub should_have_peers: bool,
}

/// One element of the `state_queryStorageAt` result.
///
/// `changes` pairs each requested key with its value at `block`; a `null`
/// value means the key holds nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChangeSet {
    pub block: String,
    pub changes: Vec<(String, Option<String>)>,
}

/// Decodes `0x`-prefixed hex data as returned by the node.
pub fn decode_hex_data(data: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(data.strip_prefix("0x").unwrap_or(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let req = RpcRequest::new(7, RpcMethod::GetStorage, serde_json::json!(["0x00"]));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "state_getStorage");
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn method_names_match_wire_form() {
        for method in [
            RpcMethod::SystemHealth,
            RpcMethod::GetStorage,
            RpcMethod::GetKeysPaged,
            RpcMethod::QueryStorageAt,
        ] {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn null_result_is_preserved() {
        let resp: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert!(resp.error.is_none());
        let value: Option<String> = serde_json::from_value(resp.result).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn error_response_parses() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[test]
    fn health_payload_parses() {
        let health: SystemHealth =
            serde_json::from_str(r#"{"peers":12,"isSyncing":false,"shouldHavePeers":true}"#)
                .unwrap();
        assert_eq!(health.peers, 12);
        assert!(!health.is_syncing);
    }

    #[test]
    fn change_set_parses_null_values() {
        let sets: Vec<StorageChangeSet> = serde_json::from_str(
            r#"[{"block":"0xabcd","changes":[["0x01","0x0203"],["0x02",null]]}]"#,
        )
        .unwrap();
        assert_eq!(sets[0].changes.len(), 2);
        assert_eq!(sets[0].changes[1].1, None);
        assert_eq!(
            decode_hex_data(sets[0].changes[0].1.as_deref().unwrap()).unwrap(),
            vec![2, 3]
        );
    }
}
