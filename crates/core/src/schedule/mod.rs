pub mod controller;

pub use controller::{Clock, RefreshController, RefreshJob, RefreshOptions, RefreshOutcome};
