//! Minimal JSON-RPC 2.0 envelope used to talk to node providers.

use std::fmt::Debug;

use serde::{
    de::{DeserializeOwned, Error, Unexpected},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::Value;

use crate::Reqwest;

#[derive(Clone, Copy, Debug)]
pub struct TwoPointZero;

impl Serialize for TwoPointZero {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("2.0")
    }
}

impl<'de> Deserialize<'de> for TwoPointZero {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "2.0" {
            Ok(TwoPointZero)
        } else {
            Err(D::Error::invalid_value(Unexpected::Str(&s), &"\"2.0\""))
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorObj {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    pub jsonrpc: TwoPointZero,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: TwoPointZero,
    pub result: Option<T>,
    pub error: Option<ErrorObj>,
}

impl<T> JsonRpcResponse<T> {
    pub fn into_result(self, method: &str) -> crate::Result<T> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(crate::Error::RpcError {
                method: method.to_string(),
                error,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(crate::Error::RpcEmptyResponse(method.to_string())),
        }
    }
}

impl Reqwest {
    /// Posts a single JSON-RPC call and unwraps its `result`.
    pub async fn rpc_call<P, R>(self, method: &str, params: P) -> crate::Result<R>
    where
        P: Serialize + Debug,
        R: DeserializeOwned + Debug,
    {
        let request = JsonRpcRequest {
            jsonrpc: TwoPointZero,
            id: 1,
            method,
            params,
        };

        self.json_body(&request)
            .receive_json::<JsonRpcResponse<R>>()
            .await?
            .into_result(method)
    }
}
