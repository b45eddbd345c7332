pub mod cache;
pub mod config_cmd;
pub mod dates;
pub mod diagnostics;
pub mod download;
pub mod logs;
pub mod metadata;
pub mod open;
pub mod set;
pub mod validate;
pub mod version;
pub mod wipe;
