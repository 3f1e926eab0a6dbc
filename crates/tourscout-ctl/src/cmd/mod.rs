//! CLI command modules.

pub mod config;
pub mod details;
pub mod search;
