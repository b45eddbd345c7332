//! Blocking client for NASA's EPIC API and image archive.

use std::io::{Read, Write};
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use ureq::Agent;
use zeroize::Zeroizing;

use super::types::{ImageMetadata, KeyStatus};
use crate::config::Settings;
use crate::errors::{EimgError, Result};

const CHUNK_SIZE: usize = 8192;

fn user_agent() -> String {
    format!("eimg/{} (Earth Image Downloader)", env!("CARGO_PKG_VERSION"))
}

pub struct EpicClient {
    api_base: String,
    archive_base: String,
    api_key: Zeroizing<String>,
    json: Agent,
    download: Agent,
}

impl EpicClient {
    pub fn new(settings: &Settings, api_key: Zeroizing<String>) -> Self {
        Self {
            api_base: settings.api_base_url.trim_end_matches('/').to_string(),
            archive_base: settings.archive_base_url.trim_end_matches('/').to_string(),
            api_key,
            json: agent(settings.request_timeout_secs),
            download: agent(settings.download_timeout_secs),
        }
    }

    /// Metadata for the most recent set of images.
    pub fn latest(&self) -> Result<Vec<ImageMetadata>> {
        let images: Vec<ImageMetadata> = self.get_json("images")?;
        if images.is_empty() {
            return Err(EimgError::NoImages("No images available".into()));
        }
        Ok(images)
    }

    /// Metadata for every image taken on `date`.
    pub fn by_date(&self, date: NaiveDate) -> Result<Vec<ImageMetadata>> {
        let day = date.format("%Y-%m-%d").to_string();
        let images: Vec<ImageMetadata> = match self.get_json(&format!("date/{day}")) {
            Err(EimgError::HttpStatus { status: 404 }) => {
                return Err(EimgError::NoImages(format!("No images found for date {day}")))
            }
            other => other?,
        };
        if images.is_empty() {
            return Err(EimgError::NoImages(format!("No images available for {day}")));
        }
        Ok(images)
    }

    /// Every date that has imagery, as `YYYY-MM-DD` strings.
    pub fn available_dates(&self) -> Result<Vec<String>> {
        let dates: Vec<String> = self.get_json("available")?;
        if dates.is_empty() {
            return Err(EimgError::NoImages("No dates available".into()));
        }
        Ok(dates)
    }

    /// Query the `images` endpoint and classify the status code.
    pub fn validate_key(&self) -> Result<KeyStatus> {
        let response = self
            .json
            .get(self.api_url("images"))
            .header("User-Agent", user_agent())
            .header("Accept", "application/json")
            .query("api_key", self.api_key.as_str())
            .call()
            .map_err(|e| self.http_error(e))?;

        Ok(match response.status().as_u16() {
            200 => KeyStatus::Valid,
            403 => KeyStatus::Rejected,
            other => KeyStatus::Unexpected(other),
        })
    }

    /// Archive URL of the full-resolution PNG for `meta`.
    pub fn image_url(&self, meta: &ImageMetadata) -> Result<String> {
        if meta.image.is_empty() {
            return Err(EimgError::InvalidResponse("image entry has no name".into()));
        }
        let day = meta.day()?;
        Ok(format!(
            "{}/{}/png/{}.png",
            self.archive_base,
            day.format("%Y/%m/%d"),
            meta.image
        ))
    }

    /// Stream `url` into `out`, reporting `(downloaded, total)` after each
    /// chunk. Returns the number of bytes written.
    pub fn download<W: Write>(
        &self,
        url: &str,
        out: &mut W,
        mut progress: impl FnMut(u64, Option<u64>),
    ) -> Result<u64> {
        let mut response = self
            .download
            .get(url)
            .header("User-Agent", user_agent())
            .header("Accept", "image/png")
            .call()
            .map_err(|e| self.http_error(e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(EimgError::HttpStatus { status });
        }

        let total = response.body().content_length();
        let mut reader = response.body_mut().as_reader();
        let mut buf = [0u8; CHUNK_SIZE];
        let mut downloaded = 0u64;

        loop {
            let n = reader
                .read(&mut buf)
                .map_err(|e| EimgError::Http(format!("download interrupted: {e}")))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            downloaded += n as u64;
            progress(downloaded, total);
        }
        out.flush()?;

        tracing::debug!(url, bytes = downloaded, "download finished");
        Ok(downloaded)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let mut response = self
            .json
            .get(self.api_url(path))
            .header("User-Agent", user_agent())
            .header("Accept", "application/json")
            .query("api_key", self.api_key.as_str())
            .call()
            .map_err(|e| self.http_error(e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            tracing::warn!(endpoint = path, status, "EPIC API returned an error status");
            return Err(EimgError::HttpStatus { status });
        }

        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| EimgError::InvalidResponse(self.redact(&e.to_string())))
    }

    fn http_error(&self, err: ureq::Error) -> EimgError {
        let message = self.redact(&err.to_string());
        tracing::error!(error = %message, "HTTP request failed");
        EimgError::Http(message)
    }

    /// Error strings may echo the request URL; keep the key out of them.
    fn redact(&self, message: &str) -> String {
        if self.api_key.is_empty() {
            return message.to_string();
        }
        message.replace(self.api_key.as_str(), "***")
    }
}

fn agent(timeout_secs: u64) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs)))
        .http_status_as_error(false)
        .build()
        .into()
}
