use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Somewhere the traces payload can be fetched from as raw text.
#[async_trait]
pub trait TraceSource: Send + Sync {
    fn location(&self) -> &str;

    async fn fetch_text(&self) -> Result<String, FetchError>;
}

pub struct FileSource {
    path: PathBuf,
    label: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }
}

#[async_trait]
impl TraceSource for FileSource {
    fn location(&self) -> &str {
        &self.label
    }

    async fn fetch_text(&self) -> Result<String, FetchError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::Io {
                path: self.label.clone(),
                source,
            })
    }
}

pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TraceSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch_text(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// `http(s)://` locations are fetched over HTTP; `file://` URLs and plain
/// paths are read from disk.
pub fn source_from_location(location: &str) -> Result<Arc<dyn TraceSource>, FetchError> {
    let trimmed = location.trim();
    if is_http_location(trimmed) {
        return Ok(Arc::new(HttpSource::new(trimmed)?));
    }
    let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
    Ok(Arc::new(FileSource::new(path)))
}

fn is_http_location(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
