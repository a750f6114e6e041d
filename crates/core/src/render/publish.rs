use crate::render::board::SignalBoard;
use crate::render::html::{render_page, PageOptions};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[async_trait::async_trait]
pub trait BoardPublisher: Send + Sync {
    async fn publish(&self, board: &SignalBoard) -> Result<()>;
}

/// Writes the rendered page to a static file, replacing it atomically so readers never see a
/// half-written table.
#[derive(Debug, Clone)]
pub struct HtmlFilePublisher {
    path: PathBuf,
    page: PageOptions,
}

impl HtmlFilePublisher {
    pub fn new(path: impl Into<PathBuf>, page: PageOptions) -> Self {
        Self {
            path: path.into(),
            page,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "index.html".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl BoardPublisher for HtmlFilePublisher {
    async fn publish(&self, board: &SignalBoard) -> Result<()> {
        let html = render_page(board, &self.page);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create output dir failed: {}", parent.display()))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, html.as_bytes())
            .await
            .with_context(|| format!("write {} failed", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename {} -> {} failed", tmp.display(), self.path.display()))?;

        tracing::debug!(path = %self.path.display(), rows = board.rows.len(), "dashboard page written");
        Ok(())
    }
}
