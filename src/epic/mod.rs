//! NASA EPIC (Earth Polychromatic Imaging Camera) API access.

pub mod client;
pub mod types;

pub use client::EpicClient;
pub use types::{parse_date, Coordinates, ImageMetadata, KeyStatus, Position};
