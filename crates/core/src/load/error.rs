use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Request,
    Status,
    Body,
    Parse,
}

impl LoadStage {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStage::Request => "request",
            LoadStage::Status => "status",
            LoadStage::Body => "body",
            LoadStage::Parse => "parse",
        }
    }
}

/// The single "load failed" class. Covers network/IO errors, non-2xx responses and bodies that
/// are not a signal document.
#[derive(Debug, Clone)]
pub struct LoadError {
    pub stage: LoadStage,
    pub url: String,
    pub detail: String,
}

impl LoadError {
    pub fn new(stage: LoadStage, url: &url::Url, detail: impl fmt::Display) -> Self {
        Self {
            stage,
            url: url.to_string(),
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "signal load failed (stage={}, url={}): {}",
            self.stage.as_str(),
            self.url,
            self.detail
        )
    }
}

impl std::error::Error for LoadError {}
