//! Bulk feed sources
//!
//! The feed is a CSV document with six unheaded columns, read over a plain
//! GET and handed to the loader chunk by chunk as it arrives.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

/// Feed error type
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("could not download {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not read feed file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of the bulk CSV feed.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    type Stream: FeedStream;

    /// Start reading the feed. Failing here means no data at all.
    async fn open(&self) -> Result<Self::Stream, FeedError>;

    /// Where the feed comes from, for logs.
    fn location(&self) -> &str;
}

/// An open feed body.
#[async_trait]
pub trait FeedStream: Send {
    /// Next chunk of the body, `None` once it is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FeedError>;
}

/// Feed downloaded over HTTP(S).
#[derive(Clone)]
pub struct HttpFeed {
    http: reqwest::Client,
    url: String,
}

impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FeedError::Client)?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    type Stream = HttpFeedStream;

    async fn open(&self) -> Result<HttpFeedStream, FeedError> {
        info!(url = %self.url, "Downloading reservations feed");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|source| FeedError::Request {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(HttpFeedStream {
            url: self.url.clone(),
            response,
            received: 0,
        })
    }

    fn location(&self) -> &str {
        &self.url
    }
}

/// Response body of an `HttpFeed`, read as it arrives.
pub struct HttpFeedStream {
    url: String,
    response: reqwest::Response,
    received: usize,
}

#[async_trait]
impl FeedStream for HttpFeedStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FeedError> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|source| FeedError::Request {
                url: self.url.clone(),
                source,
            })?;

        match chunk {
            Some(bytes) => {
                self.received += bytes.len();
                Ok(Some(bytes.to_vec()))
            }
            None => {
                debug!(bytes = self.received, "feed downloaded");
                Ok(None)
            }
        }
    }
}

/// Feed held in memory, either given directly or read from a local file.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    content: Vec<u8>,
    location: String,
    chunk_size: Option<usize>,
}

impl StaticFeed {
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: content.into(),
            location: "inline".to_string(),
            chunk_size: None,
        }
    }

    /// Hand the content out `size` bytes at a time instead of all at once.
    pub fn chunked(mut self, size: usize) -> Self {
        self.chunk_size = Some(size.max(1));
        self
    }

    pub fn from_path(path: &Path) -> Result<Self, FeedError> {
        let content = std::fs::read(path).map_err(|source| FeedError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            content,
            location: path.display().to_string(),
            chunk_size: None,
        })
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    type Stream = StaticFeedStream;

    async fn open(&self) -> Result<StaticFeedStream, FeedError> {
        let chunk_size = self.chunk_size.unwrap_or(self.content.len()).max(1);
        let chunks = self
            .content
            .chunks(chunk_size)
            .map(<[u8]>::to_vec)
            .rev()
            .collect();
        Ok(StaticFeedStream { chunks })
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Content of a `StaticFeed`, remaining chunks stored last-first.
#[derive(Debug)]
pub struct StaticFeedStream {
    chunks: Vec<Vec<u8>>,
}

#[async_trait]
impl FeedStream for StaticFeedStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FeedError> {
        Ok(self.chunks.pop())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};
    use std::net::SocketAddr;

    async fn read_all<S: FeedStream>(mut stream: S) -> Result<Vec<u8>, FeedError> {
        let mut body = Vec::new();
        while let Some(chunk) = stream.next_chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    const CSV: &str = "R100,2024-01-01,2024-01-05,DepotA,Spring Rental,AC99\n";

    async fn serve_feed() -> SocketAddr {
        let app = Router::new()
            .route("/feed.csv", get(|| async { CSV }))
            .route("/gone.csv", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn http_feed_downloads_body() {
        let addr = serve_feed().await;
        let feed =
            HttpFeed::new(format!("http://{}/feed.csv", addr), Duration::from_secs(5)).unwrap();
        let body = read_all(feed.open().await.unwrap()).await.unwrap();
        assert_eq!(body, CSV.as_bytes());
    }

    #[tokio::test]
    async fn http_feed_rejects_error_status() {
        let addr = serve_feed().await;
        let feed =
            HttpFeed::new(format!("http://{}/gone.csv", addr), Duration::from_secs(5)).unwrap();
        let err = feed.open().await.err().unwrap();
        assert!(matches!(err, FeedError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn http_feed_unreachable_host() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let feed =
            HttpFeed::new(format!("http://{}/feed.csv", addr), Duration::from_secs(2)).unwrap();
        assert!(matches!(feed.open().await, Err(FeedError::Request { .. })));
    }

    #[tokio::test]
    async fn static_feed_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), CSV).unwrap();
        let feed = StaticFeed::from_path(file.path()).unwrap();
        assert_eq!(read_all(feed.open().await.unwrap()).await.unwrap(), CSV.as_bytes());
        assert!(StaticFeed::from_path(Path::new("/nonexistent/feed.csv")).is_err());
    }

    #[tokio::test]
    async fn static_feed_in_chunks() {
        let mut stream = StaticFeed::new("abcdefg").chunked(3).open().await.unwrap();
        assert_eq!(stream.next_chunk().await.unwrap(), Some(b"abc".to_vec()));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(b"def".to_vec()));
        assert_eq!(stream.next_chunk().await.unwrap(), Some(b"g".to_vec()));
        assert_eq!(stream.next_chunk().await.unwrap(), None);

        let mut empty = StaticFeed::new("").open().await.unwrap();
        assert_eq!(empty.next_chunk().await.unwrap(), None);
    }
}
