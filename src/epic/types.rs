use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{EimgError, Result};

/// One entry of an EPIC `images` or `date/<d>` response.
///
/// Unknown fields are ignored; anything missing falls back to its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default)]
    pub identifier: String,

    /// Archive image name, without extension.
    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub caption: Option<String>,

    /// `YYYY-MM-DD HH:MM:SS`
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub centroid_coordinates: Option<Coordinates>,

    #[serde(default)]
    pub dscovr_j2000_position: Option<Position>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// DSCOVR satellite position in J2000 coordinates, km.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ImageMetadata {
    /// The calendar day part of `date`.
    pub fn day(&self) -> Result<NaiveDate> {
        let first = self.date.split_whitespace().next().unwrap_or_default();
        parse_date(first).map_err(|_| {
            EimgError::InvalidResponse(format!(
                "image '{}' has an unreadable date '{}'",
                self.image, self.date
            ))
        })
    }
}

/// Result of probing the API with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Valid,
    /// 403: invalid, expired or rate limited.
    Rejected,
    Unexpected(u16),
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    // chrono accepts single-digit fields for %m and %d; the API does not.
    if trimmed.len() != 10 {
        return Err(EimgError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| EimgError::InvalidDate(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[{
        "identifier": "20240101003633",
        "caption": "This image was taken by NASA's EPIC camera onboard the NOAA DSCOVR spacecraft",
        "image": "epic_1b_20240101003633",
        "version": "03",
        "centroid_coordinates": {"lat": -21.987305, "lon": 168.73291},
        "dscovr_j2000_position": {"x": -1311233.2, "y": 642553.3, "z": 307384.6},
        "date": "2024-01-01 00:31:45"
    }]"#;

    #[test]
    fn parses_api_payload() {
        let items: Vec<ImageMetadata> = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.image, "epic_1b_20240101003633");
        assert_eq!(item.centroid_coordinates.unwrap().lon, 168.73291);
        assert_eq!(item.dscovr_j2000_position.unwrap().z, 307384.6);
        assert_eq!(item.day().unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn missing_fields_default() {
        let item: ImageMetadata = serde_json::from_str(r#"{"image": "x"}"#).unwrap();
        assert!(item.caption.is_none());
        assert!(item.centroid_coordinates.is_none());
        assert!(item.day().is_err());
    }

    #[test]
    fn date_parsing() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(parse_date(" 2024-01-05 ").is_ok());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("2024-1-5").is_err());
        assert!(parse_date("01/05/2024").is_err());
        assert!(parse_date("").is_err());
    }
}
