pub mod domain;
pub mod load;
pub mod render;
pub mod schedule;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;
    use url::Url;

    const DEFAULT_PAGE_URL: &str = "http://localhost:8000/web/";
    const DEFAULT_OUTPUT: &str = "web/index.html";
    const DEFAULT_REFRESH_SECS: u64 = 300;
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub page_url: String,
        pub data_url: Option<String>,
        pub refresh_secs: u64,
        pub fetch_timeout_secs: u64,
        pub output: String,
        pub market_holidays: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                page_url: std::env::var("SIGNALBOARD_PAGE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PAGE_URL.to_string()),
                data_url: std::env::var("SIGNALBOARD_DATA_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                refresh_secs: parse_env_u64("SIGNALBOARD_REFRESH_SECS")?
                    .unwrap_or(DEFAULT_REFRESH_SECS),
                fetch_timeout_secs: parse_env_u64("SIGNALBOARD_FETCH_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
                output: std::env::var("SIGNALBOARD_OUTPUT")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
                market_holidays: std::env::var("NSE_MARKET_HOLIDAYS").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn page_url(&self) -> anyhow::Result<Url> {
            Url::parse(&self.page_url)
                .with_context(|| format!("SIGNALBOARD_PAGE_URL is not a valid URL: {}", self.page_url))
        }

        pub fn data_url_override(&self) -> anyhow::Result<Option<Url>> {
            self.data_url
                .as_deref()
                .map(|s| {
                    Url::parse(s)
                        .with_context(|| format!("SIGNALBOARD_DATA_URL is not a valid URL: {s}"))
                })
                .transpose()
        }

        pub fn refresh_interval(&self) -> Duration {
            Duration::from_secs(self.refresh_secs)
        }

        pub fn fetch_timeout(&self) -> Duration {
            Duration::from_secs(self.fetch_timeout_secs)
        }
    }

    fn parse_env_u64(key: &str) -> anyhow::Result<Option<u64>> {
        let Ok(raw) = std::env::var(key) else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let n = raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer (got {raw})"))?;
        anyhow::ensure!(n > 0, "{key} must be greater than zero");
        Ok(Some(n))
    }
}
