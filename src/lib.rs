//! Library crate for roster-scan: heuristic member classification for chat groups and channels.
pub mod classifier;
pub mod config;
pub mod directory;
pub mod error;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod server;
pub mod telegram;
pub mod types;

pub use scanner::run_scan;
