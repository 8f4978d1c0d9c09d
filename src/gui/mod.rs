mod app;
mod message;
mod widgets;

pub use app::{AqroadApp, run};
pub use message::Message;
pub use widgets::ButtonKind;
