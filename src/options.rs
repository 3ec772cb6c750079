use std::fmt;
use std::path::Path;

use crate::error::{DatasetError, Result};
use crate::feature::Feature;

/// Delimited text layout of a dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileFormat {
    /// Tab separated values.
    #[default]
    Txt,
    /// Comma separated values.
    Csv,
}

impl FileFormat {
    /// Field delimiter for this format.
    pub const fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Txt => b'\t',
            FileFormat::Csv => b',',
        }
    }

    /// Preferred file extension.
    pub const fn extension(&self) -> &'static str {
        match self {
            FileFormat::Txt => "txt",
            FileFormat::Csv => "csv",
        }
    }

    /// Determine the format from a file extension (case-insensitive).
    pub fn from_extension(extension: &str) -> Option<FileFormat> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" | "tsv" | "tab" => Some(FileFormat::Txt),
            "csv" => Some(FileFormat::Csv),
            _ => None,
        }
    }

    /// Determine the format from the extension of `path`.
    pub fn from_path(path: &Path) -> Result<FileFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(FileFormat::from_extension)
            .ok_or_else(|| DatasetError::UnsupportedFileType {
                path: path.to_path_buf(),
            })
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Txt => write!(f, "TXT"),
            FileFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// Quote character configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quote {
    /// No quoting.
    None,
    /// Quote with the specified character.
    Some(u8),
}

impl Default for Quote {
    fn default() -> Self {
        Quote::Some(b'"')
    }
}

impl Quote {
    /// Returns the quote character if set.
    pub fn char(&self) -> Option<u8> {
        match self {
            Quote::None => None,
            Quote::Some(c) => Some(*c),
        }
    }
}

/// How rows of differing width are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowSize {
    /// Every row must have the width of the first row.
    #[default]
    Same,
    /// Rows may differ; the width grows to the widest row seen and short
    /// rows read as padded with empty cells.
    Max,
}

/// Caller overrides applied while reading a dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Dataset identifier, replacing the one found in (or derived from) the file.
    pub id: Option<String>,
    /// Dataset display name.
    pub name: Option<String>,
    /// Column feature whose scale seeds every column without a TYPE code.
    pub element_feature: Option<Feature>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn element_feature(mut self, feature: Feature) -> Self {
        self.element_feature = Some(feature);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("data/plants.csv")).unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            FileFormat::from_path(Path::new("plants.TXT")).unwrap(),
            FileFormat::Txt
        );
        let err = FileFormat::from_path(Path::new("plants.xlsx")).unwrap_err();
        assert!(err.is_usage());
        assert!(FileFormat::from_path(Path::new("plants")).is_err());
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(FileFormat::Txt.delimiter(), b'\t');
        assert_eq!(FileFormat::Csv.delimiter(), b',');
    }

    #[test]
    fn test_read_options_builder() {
        let options = ReadOptions::new().id("trial").name("Field Trial");
        assert_eq!(options.id.as_deref(), Some("trial"));
        assert_eq!(options.name.as_deref(), Some("Field Trial"));
        assert!(options.element_feature.is_none());
    }
}
