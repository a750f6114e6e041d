pub mod board;
pub mod html;
pub mod publish;

pub use board::{SharedBoard, SignalBoard, SignalRow};
pub use publish::{BoardPublisher, HtmlFilePublisher};
