//! HTTP backend: dispatches a tool call as an outbound request.

use super::ToolExecutor;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use toolrt_core::{Result, RuntimeError, ToolBackend, ToolContext, ToolSpec};

/// Dispatches `ToolBackend::Http { url, method, headers }`, sending
/// arguments as the JSON body for mutating methods and as query parameters
/// for `GET`/`HEAD`. A non-2xx response is classified by status family:
/// 5xx (and connection failures) become [`RuntimeError::Unavailable`] —
/// retryable and circuit-breaker countable — while 4xx becomes a
/// non-retryable [`RuntimeError::ToolError`].
pub struct HttpToolExecutor {
    client: Client,
}

impl HttpToolExecutor {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpToolExecutor {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

#[async_trait]
impl ToolExecutor for HttpToolExecutor {
    async fn execute(&self, spec: &ToolSpec, arguments: &Value, _ctx: &ToolContext) -> Result<Value> {
        let ToolBackend::Http {
            url,
            method,
            headers,
        } = &spec.backend
        else {
            return Err(RuntimeError::InvalidOperation {
                operation: format!("{} is not an http tool", spec.id),
            });
        };

        let method = method
            .parse::<reqwest::Method>()
            .map_err(|e| RuntimeError::InvalidOperation {
                operation: format!("invalid HTTP method {method:?}: {e}"),
            })?;

        let mut request = self.client.request(method.clone(), url);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        request = if method == reqwest::Method::GET || method == reqwest::Method::HEAD {
            request.query(arguments)
        } else {
            request.json(arguments)
        };

        let response = request.send().await.map_err(|e| RuntimeError::Unavailable {
            detail: format!("request to {url} failed: {e}"),
        })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RuntimeError::Unavailable {
                detail: format!("{url} returned {status}"),
            });
        }
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(RuntimeError::ToolError {
                detail: format!("{url} returned {status}: {body}"),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RuntimeError::ToolError {
                detail: format!("failed to decode response body from {url}: {e}"),
            })
    }
}
