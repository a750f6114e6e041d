use crate::config::Settings;
use crate::domain::signal::SignalDocument;
use crate::load::error::{LoadError, LoadStage};
use crate::load::location::{cache_busted, resolve_data_url};
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[async_trait::async_trait]
pub trait SignalSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn load(&self) -> std::result::Result<SignalDocument, LoadError>;
}

/// Loads the signal document from a URL: `http(s)` with a single GET, `file` from local disk.
#[derive(Debug, Clone)]
pub struct UrlSignalSource {
    http: reqwest::Client,
    data_url: Url,
}

impl UrlSignalSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let data_url = match settings.data_url_override()? {
            Some(url) => url,
            None => resolve_data_url(&settings.page_url()?)?,
        };
        Self::new(data_url, settings.fetch_timeout())
    }

    pub fn new(data_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build signal http client")?;

        Ok(Self { http, data_url })
    }

    pub fn with_default_timeout(data_url: Url) -> Result<Self> {
        Self::new(data_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn data_url(&self) -> &Url {
        &self.data_url
    }

    async fn fetch_http(&self, url: &Url) -> std::result::Result<String, LoadError> {
        let res = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LoadError::new(LoadStage::Request, url, e))?;

        let status = res.status();
        if !status.is_success() {
            return Err(LoadError::new(LoadStage::Status, url, format!("HTTP {status}")));
        }

        res.text()
            .await
            .map_err(|e| LoadError::new(LoadStage::Body, url, e))
    }

    async fn read_file(&self, url: &Url) -> std::result::Result<String, LoadError> {
        let path = url
            .to_file_path()
            .map_err(|_| LoadError::new(LoadStage::Request, url, "not a local file path"))?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::new(LoadStage::Request, url, format!("{}: {e}", path.display())))
    }
}

#[async_trait::async_trait]
impl SignalSource for UrlSignalSource {
    fn source_name(&self) -> &'static str {
        "url"
    }

    async fn load(&self) -> std::result::Result<SignalDocument, LoadError> {
        let url = cache_busted(&self.data_url, chrono::Utc::now());

        let text = match url.scheme() {
            "http" | "https" => self.fetch_http(&url).await?,
            "file" => self.read_file(&url).await?,
            other => {
                return Err(LoadError::new(
                    LoadStage::Request,
                    &url,
                    format!("unsupported scheme: {other}"),
                ))
            }
        };

        let doc = SignalDocument::parse(&text)
            .map_err(|e| LoadError::new(LoadStage::Parse, &url, format!("{e:#}")))?;

        tracing::debug!(url = %url, signals = doc.len(), "signal document loaded");
        Ok(doc)
    }
}
