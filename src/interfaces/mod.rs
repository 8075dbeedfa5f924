//! Inbound adapters: REST API and websocket notifications

pub mod http;
pub mod ws;
