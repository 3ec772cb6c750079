//! feature-table: feature-annotated delimited datasets
//!
//! Reads and writes rectangular datasets stored as tab (TXT) or comma (CSV)
//! separated text. The first row names the columns; optional sentinel rows
//! (`NAME`, `TYPE`, `MIN`, `MAX`) describe their display names, measurement
//! scales, data types and bounds. Every column becomes a [`Feature`] whose
//! [`Scale`] tracks the observed bounds or distinct values as data rows are
//! converted to typed [`Value`]s.
//!
//! # Quick Start
//!
//! ```no_run
//! use feature_table::{FileFormat, ReadOptions, read};
//!
//! let dataset = read("plants.txt", None, ReadOptions::default()).unwrap();
//!
//! println!("Dataset: {} ({} rows)", dataset.id(), dataset.num_rows());
//! for feature in dataset.features() {
//!     println!("  {}: {} {}", feature.id(), feature.scale_type(), feature.data_type());
//! }
//!
//! feature_table::write(&dataset, "plants.csv", Some(FileFormat::Csv)).unwrap();
//! ```
//!
//! # File Layout
//!
//! ```text
//! ID      colA    colB
//! TYPE            NS      RD
//! MIN                     0.0
//! r1      x       5.0
//! ```
//!
//! A `TYPE` code is a scale letter (`N`ominal, `O`rdinal, `I`nterval,
//! `R`atio) optionally followed by a data type letter (`S`tring, `I`nteger,
//! `D`ouble, `B`oolean, da`T`e). Columns without a code are nominal and take
//! the data type their values convert to.

pub mod data_type;
pub mod dataset;
pub mod dsv;
pub mod encoding;
mod error;
pub mod feature;
pub mod options;
pub mod reader;
pub mod scale;
pub mod value;
pub mod writer;

pub use data_type::{DataType, ScaleType};
pub use dataset::{Dataset, Row};
pub use dsv::convert::{ConversionTypes, Converter, Position};
pub use error::{DatasetError, Result};
pub use feature::{Feature, RowHeader};
pub use options::{FileFormat, Quote, ReadOptions, RowSize};
pub use reader::{DatasetReader, read};
pub use scale::Scale;
pub use value::Value;
pub use writer::{DatasetWriter, write};

// Re-export for advanced usage
pub use encoding::{detect_and_transcode, encoding_for_label, is_utf8};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api() {
        let _reader = DatasetReader::new(FileFormat::Txt);
        let _writer = DatasetWriter::new(FileFormat::Csv);
        let _types = ConversionTypes::INTEGER | ConversionTypes::REAL;
        let _row_size = RowSize::Max;
        let _quote = Quote::Some(b'"');
        let _feature = Feature::with_scale("a", Scale::ratio(DataType::Real));
    }

    #[test]
    fn test_read_simple_txt() {
        let data = b"ID\ta\tb\nr1\t1\tx\nr2\t2\ty\n";
        let reader = DatasetReader::new(FileFormat::Txt);

        let dataset = reader.read_bytes(data).unwrap();

        assert_eq!(dataset.num_columns(), 2);
        assert_eq!(dataset.num_rows(), 2);
        assert_eq!(dataset.features()[0].data_type(), DataType::Integer);
    }

    #[test]
    fn test_builder_pattern() {
        let mut reader = DatasetReader::new(FileFormat::Csv);
        reader
            .row_size(RowSize::Max)
            .strict(true)
            .comment_prefix(None)
            .preserve_empty_strings(true)
            .conversion_types(ConversionTypes::STRING);

        let mut writer = DatasetWriter::new(FileFormat::Csv);
        writer.overwrite(true).comment_prefix(Some("%"));
    }
}
