//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the audio core:
//! - Logging and tracing infrastructure
//! - Manager configuration and progress options
//! - Playback event bus
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the playback manager and its
//! hosts depend on. It establishes the logging conventions, the fail-fast
//! configuration builder, and the broadcast channel used to observe playback
//! from async code.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
