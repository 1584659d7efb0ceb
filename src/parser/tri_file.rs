use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::TransformError;

/// A TRI flat file loaded into memory: tab-separated, ISO-8859-1, one
/// header row.
#[derive(Debug, Clone)]
pub struct TriTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TriTable {
    pub fn read_path(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read TRI file {:?}", path))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let headers = csv_reader
            .byte_headers()
            .context("Failed to read header row")?
            .iter()
            .map(|h| latin1(h).trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (line, record) in csv_reader.byte_records().enumerate() {
            let record = record.with_context(|| format!("Failed to read row {}", line + 2))?;
            if record.iter().all(|field| field.iter().all(u8::is_ascii_whitespace)) {
                continue;
            }
            rows.push(record.iter().map(|field| latin1(field).trim().to_string()).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a declared column. Published headers carry a numbering
    /// prefix ("12. TRIFD"), so a name also matches once that is stripped.
    pub fn column_index(&self, name: &str) -> Result<usize, TransformError> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|h| h == wanted)
            .or_else(|| self.headers.iter().position(|h| strip_numbering(h) == wanted))
            .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> impl Iterator<Item = TriRow<'_>> {
        self.rows.iter().map(|values| TriRow { values })
    }
}

/// One data row; cells past the end of a short row read as empty
#[derive(Debug, Clone, Copy)]
pub struct TriRow<'a> {
    values: &'a [String],
}

impl<'a> TriRow<'a> {
    pub fn get(&self, index: usize) -> &'a str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Like [`get`](Self::get) but `None` for blank cells
    pub fn non_empty(&self, index: usize) -> Option<&'a str> {
        Some(self.get(index)).filter(|v| !v.is_empty())
    }
}

/// ISO-8859-1 maps every byte to the code point of the same value
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn strip_numbering(header: &str) -> &str {
    match header.split_once(". ") {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit() || c == '.') => {
            rest.trim()
        }
        _ => header,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_tab_separated_latin1() {
        let mut data = b"1. TRIFD\t2. FACILITY NAME\t3. AMOUNT\n".to_vec();
        data.extend_from_slice(b"00001ABCDE\tCaf\xe9 Plastics\t 12.5 \n");
        data.extend_from_slice(b"\t\t\n");
        data.extend_from_slice(b"00002ABCDE\tShort row\n");

        let table = TriTable::from_reader(data.as_slice()).unwrap();
        assert_eq!(table.len(), 2);

        let name = table.column_index("FACILITY NAME").unwrap();
        let amount = table.column_index("3. AMOUNT").unwrap();
        let rows: Vec<_> = table.rows().collect();

        assert_eq!(rows[0].get(name), "Café Plastics");
        assert_eq!(rows[0].get(amount), "12.5");
        assert_eq!(rows[1].get(amount), "");
        assert_eq!(rows[1].non_empty(amount), None);
    }

    #[test]
    fn test_missing_column() {
        let table = TriTable::from_reader(&b"A\tB\n1\t2\n"[..]).unwrap();
        assert!(matches!(
            table.column_index("C"),
            Err(TransformError::MissingColumn(name)) if name == "C"
        ));
    }

    #[test]
    fn test_strip_numbering() {
        assert_eq!(strip_numbering("12. TRIFD"), "TRIFD");
        assert_eq!(strip_numbering("8.1. RECYCLING"), "RECYCLING");
        assert_eq!(strip_numbering("ST. LOUIS"), "ST. LOUIS");
    }
}
