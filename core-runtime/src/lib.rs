//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the bookmark sync core:
//! - Logging and tracing infrastructure
//! - Source configuration and the `CoreConfig` builder
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, how settings are read from and
//! written back to the host settings store, and the event broadcasting used
//! to observe synchronization runs.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
