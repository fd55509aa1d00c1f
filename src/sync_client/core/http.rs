use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::types::SyncError;

/// Raw JSON round-trips against the backend. Implementations return the
/// decoded body for any response that carries JSON, regardless of status;
/// interpreting `success` is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, path: &str) -> Result<Value, SyncError>;

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, SyncError>;
}

/// `reqwest`-backed transport for the CRM backend.
#[derive(Clone)]
pub struct HttpClient {
    http: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self, SyncError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(SyncError::from)?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn decode(path: &str, response: Response) -> Result<Value, SyncError> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(SyncError::from)?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(SyncError::Transport(format!(
                "{} returned {}",
                path, status
            ))),
            Err(err) => Err(SyncError::Transport(format!(
                "{} returned a non-JSON body: {}",
                path, err
            ))),
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, path: &str) -> Result<Value, SyncError> {
        debug!(%path, "GET");
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(SyncError::from)?;
        Self::decode(path, response).await
    }

    async fn post_json(&self, path: &str, body: Option<Value>) -> Result<Value, SyncError> {
        debug!(%path, "POST");
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(SyncError::from)?;
        Self::decode(path, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP reply on a loopback port and return a client for it.
    async fn serve_once(status_line: &str, content_type: &str, body: &str) -> HttpClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let reply = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let config = Config {
            api_base_url: format!("http://{addr}"),
            ..Config::default()
        };
        HttpClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn json_body_is_returned_on_success() {
        let client = serve_once("200 OK", "application/json", r#"{"success":true}"#).await;
        let value = client.get_json("/api/oauth/status").await.unwrap();
        assert_eq!(value, json!({"success": true}));
    }

    #[tokio::test]
    async fn error_status_with_envelope_is_passed_through() {
        let client = serve_once(
            "401 Unauthorized",
            "application/json",
            r#"{"success":false,"error":"token expired","action_required":"Re-authorize"}"#,
        )
        .await;
        let value = client.get_json("/api/oauth/status").await.unwrap();
        assert_eq!(value["error"], "token expired");
        assert_eq!(value["action_required"], "Re-authorize");
    }

    #[tokio::test]
    async fn html_body_is_a_transport_error() {
        let client = serve_once("200 OK", "text/html", "<html>login</html>").await;
        let err = client.get_json("/api/oauth/status").await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(ref m) if m.contains("non-JSON")));
    }

    #[tokio::test]
    async fn error_status_without_json_is_a_transport_error() {
        let client = serve_once("502 Bad Gateway", "text/plain", "upstream down").await;
        let err = client.get_json("/api/oauth/status").await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = Config {
            api_base_url: format!("http://{addr}"),
            ..Config::default()
        };
        let client = HttpClient::new(&config).unwrap();
        let err = client.get_json("/api/oauth/status").await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
    }
}
