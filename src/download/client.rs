use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{DownloadConfig, FileVariant};

/// Fetches the yearly TRI Basic Plus archives
pub struct TriDownloader {
    client: reqwest::Client,
    base_url: String,
}

impl TriDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tri-additives-to-sqlite/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn archive_url(&self, variant: FileVariant, year: u16) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            variant.archive_name(year)
        )
    }

    /// Download one archive to `dest`, returning the number of bytes written
    pub async fn download_archive(&self, variant: FileVariant, year: u16, dest: &Path) -> Result<u64> {
        let url = self.archive_url(variant, year);
        info!(%url, "Downloading TRI archive");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to start download of {}", url))?;

        if !response.status().is_success() {
            bail!("Download of {} failed with HTTP {}", url, response.status());
        }

        let total_size = response.content_length().unwrap_or(0);
        let mut file = std::fs::File::create(dest)
            .with_context(|| format!("Failed to create destination file {:?}", dest))?;

        let mut downloaded: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .context("Failed to read from response")?
        {
            file.write_all(&chunk).context("Failed to write to file")?;
            downloaded += chunk.len() as u64;
            debug!(progress = %format_bytes(downloaded, total_size), "Downloading");
        }

        info!(file = %variant, size = %format_bytes(downloaded, total_size), "Download complete");
        Ok(downloaded)
    }
}

/// Format bytes as human-readable string
fn format_bytes(current: u64, total: u64) -> String {
    fn fmt(bytes: u64) -> String {
        if bytes >= 1_000_000_000 {
            format!("{:.1} GB", bytes as f64 / 1_000_000_000.0)
        } else if bytes >= 1_000_000 {
            format!("{:.1} MB", bytes as f64 / 1_000_000.0)
        } else if bytes >= 1_000 {
            format!("{:.1} KB", bytes as f64 / 1_000.0)
        } else {
            format!("{} B", bytes)
        }
    }
    if total == 0 {
        fmt(current)
    } else {
        format!("{} / {}", fmt(current), fmt(total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500, 999), "500 B / 999 B");
        assert_eq!(format_bytes(1500, 3000), "1.5 KB / 3.0 KB");
        assert_eq!(format_bytes(1_500_000, 0), "1.5 MB");
    }

    #[test]
    fn test_archive_url() {
        let downloader = TriDownloader::new(&DownloadConfig {
            base_url: "https://www3.epa.gov/tri/current/".into(),
        })
        .unwrap();
        assert_eq!(
            downloader.archive_url(FileVariant::File1b, 2022),
            "https://www3.epa.gov/tri/current/US_1b_2022.zip"
        );
    }
}
