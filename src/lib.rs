pub mod cache;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod download;
pub mod epic;
pub mod errors;
pub mod logging;
pub mod vault;
