use anyhow::{bail, Result};
use tracing::info;

use crate::config::FileVariant;

/// Resolve which TRI files to process from include/exclude filters.
/// The result is always in processing order.
pub fn resolve_files(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<FileVariant>> {
    let files = match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let wanted = parse_variants(&include_list)?;
            FileVariant::ALL
                .into_iter()
                .filter(|v| wanted.contains(v))
                .collect::<Vec<_>>()
        }
        (None, Some(exclude_list)) => {
            let excluded = parse_variants(&exclude_list)?;
            FileVariant::ALL
                .into_iter()
                .filter(|v| !excluded.contains(v))
                .collect()
        }
        (None, None) => FileVariant::ALL.to_vec(),
    };

    if files.is_empty() {
        bail!("No TRI files left to process after filtering");
    }

    let names: Vec<String> = files.iter().map(ToString::to_string).collect();
    info!(files = ?names, "Resolved TRI files");
    Ok(files)
}

fn parse_variants(names: &[String]) -> Result<Vec<FileVariant>> {
    names
        .iter()
        .map(|name| name.parse::<FileVariant>().map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_default_is_all_in_order() {
        assert_eq!(resolve_files(None, None).unwrap(), FileVariant::ALL.to_vec());
    }

    #[test]
    fn test_include_keeps_processing_order() {
        let files = resolve_files(names(&["3c", "file_1b"]), None).unwrap();
        assert_eq!(files, vec![FileVariant::File1b, FileVariant::File3c]);
    }

    #[test]
    fn test_exclude() {
        let files = resolve_files(None, names(&["1a", "3a"])).unwrap();
        assert_eq!(files, vec![FileVariant::File1b, FileVariant::File3c]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(resolve_files(names(&["1a"]), names(&["3a"])).is_err());
        assert!(resolve_files(names(&["2b"]), None).is_err());
        assert!(resolve_files(None, names(&["1a", "1b", "3a", "3c"])).is_err());
    }
}
