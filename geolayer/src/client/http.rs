//! HTTP client abstraction for testability.
//!
//! The trait allows dependency injection so tests can substitute scripted
//! clients without network access. The real implementation wraps reqwest's
//! async client.

use std::future::Future;

use tracing::{debug, trace, warn};

use super::error::ClientError;

/// A file payload for multipart upload requests.
#[derive(Debug, Clone)]
pub struct FilePayload {
    /// Form field name (the backend expects `file`)
    pub field: String,
    /// Original file name, used by the server for format sniffing
    pub file_name: String,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

/// Trait for asynchronous HTTP operations against the backend services.
///
/// Each call is a single request/response; no retries, no client-side
/// timeout beyond the transport's own.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs a GET request, returning the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    /// Performs a POST request with a JSON body.
    fn post_json(
        &self,
        url: &str,
        json_body: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    /// Performs a POST request with an empty body (parameters in the query
    /// string).
    fn post_empty(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    /// Performs a multipart POST uploading a single file.
    fn post_file(
        &self,
        url: &str,
        payload: FilePayload,
    ) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    /// Performs a DELETE request.
    fn delete(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client with default configuration: 30 s timeout and a warm
    /// connection pool for repeated catalog calls.
    pub fn new() -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(16)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    async fn read_response(
        url: &str,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Vec<u8>, ClientError> {
        let response = match response {
            Ok(resp) => {
                debug!(url, status = resp.status().as_u16(), "HTTP response received");
                resp
            }
            Err(e) => {
                warn!(url, error = %e, is_timeout = e.is_timeout(), "HTTP request failed");
                return Err(ClientError::Network(format!("request failed: {}", e)));
            }
        };

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "HTTP error status");
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        trace!(url, bytes = body.len(), "HTTP response body read");
        Ok(body.to_vec())
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        trace!(url, "HTTP GET starting");
        Self::read_response(url, self.client.get(url).send().await).await
    }

    async fn post_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, ClientError> {
        trace!(url, "HTTP POST (json) starting");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(json_body.to_string())
            .send()
            .await;
        Self::read_response(url, response).await
    }

    async fn post_empty(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        trace!(url, "HTTP POST (empty) starting");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .send()
            .await;
        Self::read_response(url, response).await
    }

    async fn post_file(&self, url: &str, payload: FilePayload) -> Result<Vec<u8>, ClientError> {
        trace!(url, file = %payload.file_name, "HTTP POST (multipart) starting");
        let part = reqwest::multipart::Part::bytes(payload.bytes).file_name(payload.file_name);
        let form = reqwest::multipart::Form::new().part(payload.field, part);
        let response = self.client.post(url).multipart(form).send().await;
        Self::read_response(url, response).await
    }

    async fn delete(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        trace!(url, "HTTP DELETE starting");
        Self::read_response(url, self.client.delete(url).send().await).await
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// A request observed by the scripted client.
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub url: String,
        pub body: Option<String>,
    }

    /// Scripted HTTP client for tests: pops queued responses in order and
    /// records every request for later assertions.
    #[derive(Default)]
    pub struct ScriptedHttpClient {
        responses: Mutex<VecDeque<Result<Vec<u8>, ClientError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl ScriptedHttpClient {
        pub fn new(responses: Vec<Result<Vec<u8>, ClientError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn push_response(&self, response: Result<Vec<u8>, ClientError>) {
            self.responses.lock().unwrap().push_back(response);
        }

        pub fn recorded(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn next(&self, method: &str, url: &str, body: Option<String>) -> Result<Vec<u8>, ClientError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                method: method.to_string(),
                url: url.to_string(),
                body,
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
        }
    }

    impl AsyncHttpClient for Arc<ScriptedHttpClient> {
        async fn get(&self, url: &str) -> Result<Vec<u8>, ClientError> {
            self.next("GET", url, None)
        }

        async fn post_json(&self, url: &str, json_body: &str) -> Result<Vec<u8>, ClientError> {
            self.next("POST", url, Some(json_body.to_string()))
        }

        async fn post_empty(&self, url: &str) -> Result<Vec<u8>, ClientError> {
            self.next("POST", url, None)
        }

        async fn post_file(&self, url: &str, payload: FilePayload) -> Result<Vec<u8>, ClientError> {
            self.next("POST", url, Some(payload.file_name))
        }

        async fn delete(&self, url: &str) -> Result<Vec<u8>, ClientError> {
            self.next("DELETE", url, None)
        }
    }

    #[tokio::test]
    async fn test_scripted_client_pops_in_order() {
        let client = ScriptedHttpClient::new(vec![
            Ok(vec![1]),
            Err(ClientError::Network("down".to_string())),
        ]);

        assert_eq!(client.get("http://a").await.unwrap(), vec![1]);
        assert!(client.get("http://b").await.is_err());

        let recorded = client.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].url, "http://a");
        assert_eq!(recorded[1].url, "http://b");
    }
}
