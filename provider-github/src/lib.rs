//! # GitHub Provider
//!
//! Implements `ContentProvider` over the GitHub REST API (v3), for both
//! github.com and GitHub Enterprise hosts.
//!
//! ## Overview
//!
//! This module provides:
//! - A repository access check ahead of every content read, so a bad token
//!   or repository is reported as such instead of as missing data
//! - Conditional content fetches with `If-None-Match` and the response `ETag`
//! - Single-file and directory sources; every `*.json` file directly inside
//!   a directory is fetched in parallel

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GitHubConnector;
pub use error::{GitHubError, Result};
