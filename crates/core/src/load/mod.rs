pub mod error;
pub mod location;
pub mod source;

pub use error::{LoadError, LoadStage};
pub use source::{SignalSource, UrlSignalSource};
