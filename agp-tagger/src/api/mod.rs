//! HTTP API handlers for agp-tagger
//!
//! REST endpoints for driving passes and editing selections, plus an SSE
//! stream of pass events.

pub mod health;
pub mod library;
pub mod settings;
pub mod sse;

pub use health::health_routes;
pub use library::library_routes;
pub use settings::settings_routes;
pub use sse::event_stream;
