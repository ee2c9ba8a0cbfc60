// Adapters layer: concrete implementations for external systems (LINE API, HTTP server).

pub mod line_client;

#[cfg(feature = "cli")]
pub mod server;
