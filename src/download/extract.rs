use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Extract the `.txt` members of a TRI archive into `dest_dir`, flattening
/// any directory prefix. Returns the extracted paths.
pub fn extract_tri_files(zip_path: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(zip_path).with_context(|| format!("Failed to open zip file {:?}", zip_path))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).context("Failed to read zip archive")?;

    fs::create_dir_all(dest_dir).context("Failed to create destination directory")?;

    let mut extracted = Vec::new();
    for i in 0..archive.len() {
        let mut member = archive
            .by_index(i)
            .context("Failed to read file from archive")?;

        let name = member.name().to_string();
        let Some(file_name) = Path::new(&name).file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.to_ascii_lowercase().ends_with(".txt") {
            debug!(member = %name, "Skipping archive member");
            continue;
        }

        let dest_path = dest_dir.join(file_name);
        let mut dest_file = File::create(&dest_path)
            .with_context(|| format!("Failed to create file: {:?}", dest_path))?;
        io::copy(&mut member, &mut dest_file)
            .with_context(|| format!("Failed to extract: {}", name))?;

        extracted.push(dest_path);
    }

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    #[test]
    fn test_extracts_only_text_members() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("US_1a_2022.zip");
        {
            let mut writer = zip::ZipWriter::new(File::create(&zip_path).unwrap());
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
            writer.start_file("data/US_1a_2022.txt", options).unwrap();
            writer.write_all(b"TRIFD\tCASRN\n").unwrap();
            writer.start_file("README.pdf", options).unwrap();
            writer.write_all(b"%PDF").unwrap();
            writer.finish().unwrap();
        }

        let out = dir.path().join("2022");
        let files = extract_tri_files(&zip_path, &out).unwrap();

        assert_eq!(files, vec![out.join("US_1a_2022.txt")]);
        assert_eq!(fs::read_to_string(&files[0]).unwrap(), "TRIFD\tCASRN\n");
        assert!(!out.join("README.pdf").exists());
    }
}
