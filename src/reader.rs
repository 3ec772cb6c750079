//! Dataset reader builder and `read` entry point.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::dataset::{Dataset, DatasetAssembler, Row};
use crate::dsv::convert::{ConversionTypes, Converter};
use crate::dsv::cursor::RowCursor;
use crate::dsv::header::{HeaderLayout, detect_header};
use crate::dsv::tokenizer::{DEFAULT_COMMENT_PREFIX, Tokenizer};
use crate::encoding::{detect_and_transcode, has_utf16_bom};
use crate::error::{DatasetError, Result};
use crate::feature::RowHeader;
use crate::options::{FileFormat, Quote, ReadOptions, RowSize};

/// Identifier given to datasets read from a stream without any other source of one.
pub const DEFAULT_DATASET_ID: &str = "dataset";

/// Reads feature-annotated datasets from delimited text.
///
/// # Example
///
/// ```no_run
/// use feature_table::{DatasetReader, FileFormat, RowSize};
///
/// let mut reader = DatasetReader::new(FileFormat::Csv);
/// reader.row_size(RowSize::Same).comment_prefix(Some("#"));
///
/// let dataset = reader.read_path("plants.csv").unwrap();
/// for feature in dataset.features() {
///     println!("{}: {:?}", feature.id(), feature.scale_type());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DatasetReader {
    format: FileFormat,
    row_size: RowSize,
    strict: bool,
    comment_prefix: Option<String>,
    quote: Quote,
    converter: Converter,
    encoding: Option<&'static Encoding>,
    options: ReadOptions,
}

impl DatasetReader {
    /// Create a reader for `format` with default settings.
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            row_size: RowSize::Same,
            strict: false,
            comment_prefix: Some(DEFAULT_COMMENT_PREFIX.to_string()),
            quote: Quote::default(),
            converter: Converter::new(ConversionTypes::INFER),
            encoding: None,
            options: ReadOptions::default(),
        }
    }

    /// Set how rows of differing width are handled.
    pub fn row_size(&mut self, row_size: RowSize) -> &mut Self {
        self.row_size = row_size;
        self
    }

    /// In strict mode blank lines are rows instead of being skipped.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Set the comment line prefix; `None` disables comments.
    pub fn comment_prefix(&mut self, prefix: Option<&str>) -> &mut Self {
        self.comment_prefix = prefix.map(str::to_string);
        self
    }

    pub fn quote(&mut self, quote: Quote) -> &mut Self {
        self.quote = quote;
        self
    }

    /// Keep empty cells as empty strings in columns that allow strings.
    pub fn preserve_empty_strings(&mut self, preserve: bool) -> &mut Self {
        self.converter.preserve_empty_strings(preserve);
        self
    }

    /// Allowed conversion types for every column without an override.
    pub fn conversion_types(&mut self, types: ConversionTypes) -> &mut Self {
        self.converter.default_types(types);
        self
    }

    /// Allowed conversion types for data column `column` (zero-based).
    ///
    /// Overrides both the global mask and the type declared in the file.
    pub fn column_conversion_types(&mut self, column: usize, types: ConversionTypes) -> &mut Self {
        self.converter.column_types(column, types);
        self
    }

    /// Encoding for lines that are not valid UTF-8.
    pub fn encoding(&mut self, encoding: &'static Encoding) -> &mut Self {
        self.encoding = Some(encoding);
        self
    }

    /// Dataset identifier, name and element feature overrides.
    pub fn options(&mut self, options: ReadOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Read the dataset stored at `path`.
    ///
    /// The dataset identifier defaults to the file stem when neither the
    /// options nor the file name one.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<Dataset> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(DatasetError::InvalidArgument("empty path".to_string()));
        }
        if !path.is_file() {
            return Err(DatasetError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        debug!(path = %path.display(), format = %self.format, "reading dataset");
        let default_id = path.file_stem().and_then(|s| s.to_str());
        let mut reader = BufReader::new(File::open(path)?);

        if has_utf16_bom(reader.fill_buf()?) {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            return self.read_transcoded(&data, default_id);
        }
        self.read_source(reader, default_id)
    }

    /// Read a dataset from a buffered stream of UTF-8 text.
    pub fn read_reader<R: BufRead>(&self, reader: R) -> Result<Dataset> {
        self.read_source(reader, None)
    }

    /// Read a dataset from bytes, transcoding non-UTF-8 input first.
    pub fn read_bytes(&self, data: &[u8]) -> Result<Dataset> {
        self.read_transcoded(data, None)
    }

    fn read_transcoded(&self, data: &[u8], default_id: Option<&str>) -> Result<Dataset> {
        let (data, was_transcoded) = match self.encoding {
            Some(_) => (Cow::Borrowed(data), false),
            None => detect_and_transcode(data),
        };
        if was_transcoded {
            warn!("input is not UTF-8, transcoded before reading");
        }
        self.read_source(Cursor::new(data), default_id)
    }

    fn read_source<R: BufRead>(&self, reader: R, default_id: Option<&str>) -> Result<Dataset> {
        let mut tokenizer = Tokenizer::new(reader, self.format.delimiter());
        tokenizer
            .quote(self.quote)
            .comment_prefix(self.comment_prefix.as_deref())
            .strict(self.strict)
            .encoding(self.encoding);
        let mut cursor = RowCursor::new(tokenizer, self.row_size);

        let mut converter = self.converter.clone();
        let header = detect_header(
            &mut cursor,
            &mut converter,
            self.options.element_feature.as_ref(),
        )?;

        let id = self
            .options
            .id
            .clone()
            .or_else(|| header.layout.dataset_id.clone())
            .or_else(|| default_id.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_DATASET_ID.to_string());
        let mut assembler = DatasetAssembler::new(
            id,
            self.options.name.clone(),
            header.features,
            &header.inferred,
        )?;

        let layout = header.layout;
        let mut pending = header.data_row_pending;
        while pending || cursor.next_row()? {
            pending = false;
            let at = cursor.position();
            let (row_header, row, tokens) =
                read_data_row(&mut cursor, &converter, &layout, &assembler)?;
            assembler.push_row(at, row_header, row, tokens)?;
        }

        assembler.finish()
    }
}

/// Walk the current row: identifier, optional name, then one value per column.
///
/// Source text is returned for the columns the assembler infers a type for
/// and left empty elsewhere.
fn read_data_row<R: BufRead>(
    cursor: &mut RowCursor<R>,
    converter: &Converter,
    layout: &HeaderLayout,
    assembler: &DatasetAssembler,
) -> Result<(RowHeader, Row, Vec<String>)> {
    let at = cursor.position();
    let id = cursor.next_column()?.trim().to_string();
    let name = if layout.has_row_names && cursor.has_next_column() {
        Some(cursor.next_column()?.trim().to_string())
    } else {
        None
    };
    let header = RowHeader::new(Some(&id), name.as_deref());

    let mut row = Row::with_capacity(layout.num_columns());
    let mut tokens = Vec::with_capacity(layout.num_columns());
    while cursor.has_next_column() {
        let column = cursor.column_index() - layout.data_offset();
        let token = cursor.next_column()?;
        row.push(converter.convert(token, at, column)?);
        tokens.push(if assembler.is_inferred(column) {
            token.to_string()
        } else {
            String::new()
        });
    }
    Ok((header, row, tokens))
}

/// Read the dataset at `path`.
///
/// The format is taken from the file extension when `format` is `None`.
pub fn read<P: AsRef<Path>>(
    path: P,
    format: Option<FileFormat>,
    options: ReadOptions,
) -> Result<Dataset> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => FileFormat::from_path(path)?,
    };
    let mut reader = DatasetReader::new(format);
    reader.options(options);
    reader.read_path(path)
}
