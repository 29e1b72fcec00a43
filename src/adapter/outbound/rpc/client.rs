//! JSON-RPC 2.0 transport bound to one node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

use crate::error::RpcError;

#[derive(Debug, Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct Response<R> {
    result: Option<R>,
    error: Option<RemoteError>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    code: i64,
    message: String,
}

/// HTTP client for one node's JSON-RPC endpoints.
///
/// Every request carries the timeout the client was built with. Endpoints are
/// addressed by path relative to the node's base URL (`/ext/info`,
/// `/ext/bc/P`, ...).
#[derive(Debug)]
pub struct JsonRpcClient {
    http: HttpClient,
    base: Url,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let base = Url::parse(base_url)?;
        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method` on the endpoint at `path`.
    pub async fn call<P, R>(&self, path: &str, method: &str, params: P) -> Result<R, RpcError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let url = self.base.join(path)?;
        let request = Request {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        trace!(%url, method, "JSON-RPC request");
        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        decode_response(method, status, &body)
    }
}

/// Interpret a JSON-RPC response body.
///
/// A JSON-RPC error object wins over the HTTP status, since nodes report
/// method errors with non-2xx codes.
pub(crate) fn decode_response<R: DeserializeOwned>(
    method: &str,
    status: StatusCode,
    body: &str,
) -> Result<R, RpcError> {
    let parsed = serde_json::from_str::<Response<R>>(body);

    match parsed {
        Ok(Response {
            error: Some(remote), ..
        }) => Err(RpcError::Remote {
            method: method.to_string(),
            code: remote.code,
            message: remote.message,
        }),
        _ if !status.is_success() => Err(RpcError::Status {
            method: method.to_string(),
            status: status.as_u16(),
        }),
        Ok(Response {
            result: Some(result),
            ..
        }) => Ok(result),
        Ok(Response { result: None, .. }) => Err(RpcError::EmptyResult {
            method: method.to_string(),
        }),
        Err(source) => Err(RpcError::Decode {
            method: method.to_string(),
            source,
        }),
    }
}
