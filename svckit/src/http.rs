// svckit/src/http.rs
//
// HTTP client for the metrics backend. Every request races a cancellation
// handle; transport failures are normalized into ApiError.
//

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, error};

use crate::cancel::CancellationHandle;
use crate::errors::ApiError;
use crate::types::FetchOutcome;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Setup {
                message: e.to_string(),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `base_url + path` with `params` as the query string.
    ///
    /// Resolves to `FetchOutcome::Canceled` when `cancel` fires before the
    /// response body has been read; that is never reported as an error.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
        cancel: &CancellationHandle,
    ) -> Result<FetchOutcome<Value>, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let request = async {
            let response = self
                .client
                .get(&url)
                .query(params)
                .header(CONTENT_TYPE, "application/json")
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(ApiError::from_transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(ApiError::Server {
                    status: status.as_u16(),
                });
            }

            response.json::<Value>().await.map_err(ApiError::from_body)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request canceled: {}", url);
                Ok(FetchOutcome::Canceled)
            }
            result = request => match result {
                Ok(body) => Ok(FetchOutcome::Completed(body)),
                Err(err) => {
                    error!(error = ?err, "API request to {} failed: {}", url, err);
                    Err(err)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::create_cancellation_token;
    use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route(
                "/api/echo",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    Json(json!({ "params": params }))
                }),
            )
            .route(
                "/api/fail",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/api/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({}))
                }),
            )
            .route("/api/text", get(|| async { "definitely not json" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_get_json_sends_query_params() {
        let base = spawn_backend().await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        let handle = create_cancellation_token();

        let outcome = client
            .get_json(
                "/api/echo",
                &[
                    ("startDate", "20250401".to_string()),
                    ("endDate", "20250430".to_string()),
                    ("reqType", "summary".to_string()),
                ],
                &handle,
            )
            .await
            .unwrap();

        let body = outcome.completed().unwrap();
        assert_eq!(body["params"]["startDate"], "20250401");
        assert_eq!(body["params"]["endDate"], "20250430");
        assert_eq!(body["params"]["reqType"], "summary");
    }

    #[tokio::test]
    async fn test_error_status_is_server_error() {
        let base = spawn_backend().await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .get_json("/api/fail", &[], &create_cancellation_token())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Server error: 500");
    }

    #[tokio::test]
    async fn test_cancel_resolves_to_sentinel() {
        let base = spawn_backend().await;
        let client = ApiClient::new(&base, Duration::from_secs(30)).unwrap();
        let handle = create_cancellation_token();

        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let outcome = client.get_json("/api/slow", &[], &handle).await.unwrap();
        assert!(outcome.is_canceled());
    }

    #[tokio::test]
    async fn test_already_cancelled_handle_skips_request() {
        let base = spawn_backend().await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();
        let handle = create_cancellation_token();
        handle.cancel();

        let outcome = client.get_json("/api/echo", &[], &handle).await.unwrap();
        assert!(outcome.is_canceled());
    }

    #[tokio::test]
    async fn test_timeout_is_network_error_not_cancellation() {
        let base = spawn_backend().await;
        let client = ApiClient::new(&base, Duration::from_millis(100)).unwrap();

        let err = client
            .get_json("/api/slow", &[], &create_cancellation_token())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NoResponse(_)));
        assert_eq!(err.message(), "No response received from server");
    }

    #[tokio::test]
    async fn test_timeout_while_reading_body_is_network_error() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"rows\": [";
            socket.write_all(head.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = ApiClient::new(&format!("http://{}", addr), Duration::from_millis(200)).unwrap();
        let err = client
            .get_json("/api/stalled", &[], &create_cancellation_token())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NoResponse(_)));
        assert_eq!(err.message(), "No response received from server");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client
            .get_json("/api/echo", &[], &create_cancellation_token())
            .await
            .unwrap_err();

        assert_eq!(err.message(), "No response received from server");
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid_body() {
        let base = spawn_backend().await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .get_json("/api/text", &[], &create_cancellation_token())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_missing_base_url_is_setup_error() {
        let client = ApiClient::new("", Duration::from_secs(1)).unwrap();

        let err = client
            .get_json("/api/echo", &[], &create_cancellation_token())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Setup { .. }));
    }
}
