pub mod cache;
pub mod client;
pub mod extract;

pub use cache::*;
pub use client::*;
pub use extract::*;

use anyhow::{bail, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::{DownloadConfig, FileVariant};

/// Make sure the files of a reporting year are in the cache, downloading the
/// missing ones. Returns the year's data directory.
pub async fn ensure_year_downloaded(
    config: &DownloadConfig,
    cache_dir: Option<PathBuf>,
    year: u16,
    variants: &[FileVariant],
    force: bool,
) -> Result<PathBuf> {
    let cache = CacheManager::new(cache_dir)?;
    let downloader = TriDownloader::new(config)?;

    for &variant in variants {
        if !force && cache.is_cached(year, variant) {
            info!(file = %variant, year, "Using cached file");
            continue;
        }

        let zip_path = cache.zip_path(year, variant);
        downloader.download_archive(variant, year, &zip_path).await?;
        extract_tri_files(&zip_path, &cache.year_dir(year))?;
        fs::remove_file(&zip_path).ok();

        if !cache.is_cached(year, variant) {
            bail!(
                "Archive {} did not contain {}",
                variant.archive_name(year),
                variant.file_name(year)
            );
        }
    }

    Ok(cache.year_dir(year))
}
