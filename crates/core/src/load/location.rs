use anyhow::Context;
use chrono::{DateTime, Utc};
use url::Url;

const HOSTED_PAGES_MARKER: &str = "github.io";
const RELATIVE_DATA_PATH: &str = "../data/signal.json";
const DATA_FILE_PATH: &str = "data/signal.json";
const CACHE_BUST_PARAM: &str = "v";

pub fn is_hosted_pages(page_url: &Url) -> bool {
    page_url
        .host_str()
        .is_some_and(|h| h.contains(HOSTED_PAGES_MARKER))
}

/// Where the dashboard published at `page_url` reads its signal document from.
///
/// Hosted pages serve every repository under `https://<host>/<repo>/`, so the data path is
/// rebuilt from the first path segment. Anywhere else the document sits next to the page's
/// parent directory.
pub fn resolve_data_url(page_url: &Url) -> anyhow::Result<Url> {
    if is_hosted_pages(page_url) {
        let host = page_url.host_str().context("hosted page URL has no host")?;
        let repo = page_url
            .path_segments()
            .and_then(|mut segs| segs.find(|s| !s.is_empty()));
        let raw = match repo {
            Some(repo) => format!("https://{host}/{repo}/{DATA_FILE_PATH}"),
            None => format!("https://{host}/{DATA_FILE_PATH}"),
        };
        return Url::parse(&raw).with_context(|| format!("invalid hosted data URL: {raw}"));
    }

    page_url
        .join(RELATIVE_DATA_PATH)
        .with_context(|| format!("cannot resolve {RELATIVE_DATA_PATH} against {page_url}"))
}

/// Appends `v=<epoch ms>` so intermediate caches never answer with a stale document.
pub fn cache_busted(url: &Url, now: DateTime<Utc>) -> Url {
    let mut out = url.clone();
    out.query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &now.timestamp_millis().to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn hosted_pages_use_repo_segment() {
        let page = url("https://someone.github.io/nse-signals/web/index.html");
        assert!(is_hosted_pages(&page));
        assert_eq!(
            resolve_data_url(&page).unwrap().as_str(),
            "https://someone.github.io/nse-signals/data/signal.json"
        );
    }

    #[test]
    fn hosted_pages_without_repo_segment() {
        let page = url("https://someone.github.io/");
        assert_eq!(
            resolve_data_url(&page).unwrap().as_str(),
            "https://someone.github.io/data/signal.json"
        );
    }

    #[test]
    fn other_hosts_resolve_relative_path() {
        let page = url("http://localhost:8000/web/");
        assert!(!is_hosted_pages(&page));
        assert_eq!(
            resolve_data_url(&page).unwrap().as_str(),
            "http://localhost:8000/data/signal.json"
        );

        let page = url("http://localhost:8000/web/index.html");
        assert_eq!(
            resolve_data_url(&page).unwrap().as_str(),
            "http://localhost:8000/data/signal.json"
        );
    }

    #[test]
    fn file_pages_resolve_to_sibling_data_dir() {
        let page = url("file:///srv/site/web/index.html");
        assert_eq!(
            resolve_data_url(&page).unwrap().as_str(),
            "file:///srv/site/data/signal.json"
        );
    }

    #[test]
    fn cache_buster_is_epoch_millis_and_keeps_query() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let busted = cache_busted(&url("http://h/data/signal.json"), now);
        assert_eq!(busted.as_str(), "http://h/data/signal.json?v=1704103200000");

        let busted = cache_busted(&url("http://h/data/signal.json?env=prod"), now);
        assert_eq!(busted.query(), Some("env=prod&v=1704103200000"));
    }
}
