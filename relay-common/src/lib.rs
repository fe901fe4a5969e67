//! Relay Common - Shared configuration, errors, and logging for the chat relay.
//!
//! This crate provides:
//! - Configuration types and loading (file + environment overrides)
//! - The error type for invalid settings
//! - Logging setup and per-request trace context

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    ChatConfig, Config, ConfigSource, DeepSeekConfig, GeminiConfig, ObservabilityConfig,
    ProviderConfig, ProviderKind, ServerConfig,
};
pub use error::Error;
