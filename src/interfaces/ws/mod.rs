//! Websocket interfaces

pub mod notifications;

pub use notifications::{ws_spaces_handler, EventFilter, NotificationState};
