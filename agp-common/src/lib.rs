//! # AutoGenre Common Library
//!
//! Shared code for the AutoGenre services:
//! - Error type
//! - Event types (AgpEvent enum) and the broadcast EventBus
//! - Bootstrap configuration loading and TOML persistence helpers
//! - SSE stream helper

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
pub use events::{AgpEvent, EventBus, PassKind};
