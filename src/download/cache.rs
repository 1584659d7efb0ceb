use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::FileVariant;

/// On-disk layout of downloaded TRI files: one directory per reporting year
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let cache_dir = match custom_dir {
            Some(dir) => dir,
            None => {
                let proj_dirs = ProjectDirs::from("", "", "tri-additives-to-sqlite")
                    .context("Could not determine cache directory")?;
                proj_dirs.cache_dir().to_path_buf()
            }
        };

        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {:?}", cache_dir))?;

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory holding the extracted files of a reporting year
    pub fn year_dir(&self, year: u16) -> PathBuf {
        self.cache_dir.join(year.to_string())
    }

    pub fn file_path(&self, year: u16, variant: FileVariant) -> PathBuf {
        self.year_dir(year).join(variant.file_name(year))
    }

    pub fn is_cached(&self, year: u16, variant: FileVariant) -> bool {
        self.file_path(year, variant).is_file()
    }

    /// Where the archive is written before extraction
    pub fn zip_path(&self, year: u16, variant: FileVariant) -> PathBuf {
        self.cache_dir.join(variant.archive_name(year))
    }
}
