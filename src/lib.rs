//! Idle Sweeper - deletes stale files from a folder that has gone quiet
//!
//! This crate provides:
//! - Time-point normalization between the filesystem and wall clocks
//! - A polling loop that gates sweeps on the folder's own idle time
//! - A sweep that deletes every file idle past the threshold

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod watcher;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SweeperError};
pub use watcher::{StopReason, WatchOptions, WatchService};
