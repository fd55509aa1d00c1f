use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use crate::config::Config;
use crate::types::SyncError;

pub const DEFAULT_USER_AGENT: &str = "crm-cloud-sync-offline-cache";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedAsset {
    pub fn ok(content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: content_type.map(str::to_string),
            body: body.into(),
        }
    }

    /// Only complete successful responses are worth keeping.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }
}

/// Network side of the cache. Returns whatever the server answered; an
/// `Err` means no response at all.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<CachedAsset, SyncError>;
}

pub struct HttpFetcher {
    client: Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<CachedAsset, SyncError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
        }

        Ok(CachedAsset {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn fetcher_for(reply: String) -> HttpFetcher {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await.unwrap();
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let config = Config {
            api_base_url: format!("http://{addr}"),
            ..Config::default()
        };
        HttpFetcher::new(&config).unwrap()
    }

    #[tokio::test]
    async fn fetch_collects_body_and_headers() {
        let fetcher = fetcher_for(
            "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: 9\r\nConnection: close\r\n\r\nbody{x:1}"
                .to_string(),
        )
        .await;
        let asset = fetcher.fetch("/static/app.css").await.unwrap();
        assert_eq!(asset.status, 200);
        assert_eq!(asset.content_type.as_deref(), Some("text/css"));
        assert_eq!(asset.body, b"body{x:1}");
    }

    #[tokio::test]
    async fn oversized_content_length_fails_without_allocating() {
        let fetcher = fetcher_for(
            "HTTP/1.1 200 OK\r\nContent-Length: 1000000000000000\r\nConnection: close\r\n\r\nshort"
                .to_string(),
        )
        .await;
        assert!(matches!(
            fetcher.fetch("/index.html").await,
            Err(SyncError::Transport(_))
        ));
    }
}
