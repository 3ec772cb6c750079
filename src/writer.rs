//! Dataset writer: the inverse of [`crate::reader`].

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::data_type::type_code;
use crate::dataset::Dataset;
use crate::dsv::emitter::RowEmitter;
use crate::dsv::header::{HeaderState, Sentinel};
use crate::dsv::tokenizer::DEFAULT_COMMENT_PREFIX;
use crate::error::{DatasetError, Result};
use crate::options::{FileFormat, RowSize};
use crate::value::Value;

/// Writes datasets as delimited text with sentinel header rows.
///
/// The identifier row is followed by a NAME row when any column has a
/// display name, an always-present TYPE row, and MIN/MAX rows when any
/// column carries bounds. Reading the output back yields the same features,
/// row headers and values.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    format: FileFormat,
    overwrite: bool,
    comment_prefix: Option<String>,
}

impl DatasetWriter {
    pub fn new(format: FileFormat) -> Self {
        Self {
            format,
            overwrite: false,
            comment_prefix: Some(DEFAULT_COMMENT_PREFIX.to_string()),
        }
    }

    /// Replace an existing file instead of failing.
    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// Comment prefix the output will be read with; row identifiers may not start with it.
    pub fn comment_prefix(&mut self, prefix: Option<&str>) -> &mut Self {
        self.comment_prefix = prefix.filter(|p| !p.is_empty()).map(str::to_string);
        self
    }

    /// Write `dataset` to a new file at `path`.
    ///
    /// A partially written file is removed when writing fails.
    pub fn write_path<P: AsRef<Path>>(&self, dataset: &Dataset, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(DatasetError::InvalidArgument("empty path".to_string()));
        }

        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => DatasetError::FileExists {
                path: path.to_path_buf(),
            },
            _ => DatasetError::Io(e),
        })?;

        debug!(path = %path.display(), format = %self.format, "writing dataset");
        let result = self
            .write_to(dataset, BufWriter::new(file))
            .and_then(|mut writer| writer.flush().map_err(DatasetError::from));

        if let Err(err) = result {
            if let Err(cleanup) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %cleanup, "could not remove partial file");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Write `dataset` to `writer`, returning it once every row is written.
    pub fn write_to<W: Write>(&self, dataset: &Dataset, writer: W) -> Result<W> {
        let mut emitter = RowEmitter::new(writer, self.format.delimiter(), RowSize::Same);
        let row_names = self.uses_row_names(dataset);
        let features = dataset.features();

        emitter.new_row()?;
        if row_names {
            emitter.write_cells([Sentinel::Id.keyword(), Sentinel::Name.keyword()])?;
        } else if self.writes_dataset_id(dataset) {
            emitter.write_cell(dataset.id())?;
        } else {
            emitter.write_cell(Sentinel::Id.keyword())?;
        }
        emitter.write_cells(features.iter().map(|f| f.id()))?;

        let mut state = HeaderState::ExpectName;
        if features.iter().any(|f| f.has_name()) {
            let names = features.iter().map(|f| f.name().to_string());
            state = sentinel_row(&mut emitter, state, Sentinel::Name, row_names, names)?;
        }

        let codes = features
            .iter()
            .map(|f| type_code(f.scale_type(), f.data_type()));
        state = sentinel_row(&mut emitter, state, Sentinel::Type, row_names, codes)?;

        // Blank bound rows also keep a first row identifier of MIN from
        // being taken for the bounds row.
        let has_bounds = features
            .iter()
            .any(|f| f.scale().minimum().is_some() || f.scale().maximum().is_some());
        let first_id = dataset.row_headers().first().and_then(|h| h.id());
        let ambiguous = first_id.is_some_and(|id| state.accept(id).is_some());
        if has_bounds || ambiguous {
            let bound = |value: Option<&Value>| value.map(Value::to_string).unwrap_or_default();
            let minima = features.iter().map(|f| bound(f.scale().minimum()));
            state = sentinel_row(&mut emitter, state, Sentinel::Min, row_names, minima)?;
            let maxima = features.iter().map(|f| bound(f.scale().maximum()));
            sentinel_row(&mut emitter, state, Sentinel::Max, row_names, maxima)?;
        }

        for (header, row) in dataset.iter() {
            let id = header.id().unwrap_or_default();
            self.check_row_id(id, emitter.row_number() + 1)?;

            emitter.new_row()?;
            emitter.write_cell(id)?;
            if row_names {
                emitter.write_cell(header.name().unwrap_or(id))?;
            }
            for value in row {
                match value {
                    Some(value) => emitter.write_cell(&value.to_string())?,
                    None => emitter.write_cell("")?,
                }
            }
        }

        debug!(
            dataset = dataset.id(),
            rows = dataset.num_rows(),
            columns = dataset.num_columns(),
            "wrote dataset"
        );
        emitter.finish()
    }

    /// Whether the `ID,NAME` layout is needed: rows have names, or the
    /// first column would otherwise be read as the NAME marker.
    fn uses_row_names(&self, dataset: &Dataset) -> bool {
        if dataset.has_row_names() {
            return true;
        }
        !self.writes_dataset_id(dataset)
            && dataset
                .features()
                .first()
                .is_some_and(|f| f.id() == Sentinel::Name.keyword())
    }

    /// Whether the dataset identifier can stand in the first cell of the
    /// identifier row without being read as something else.
    fn writes_dataset_id(&self, dataset: &Dataset) -> bool {
        let id = dataset.id();
        !dataset.has_row_names()
            && id == id.trim()
            && id != Sentinel::Id.keyword()
            && !self.is_comment(id)
    }

    fn is_comment(&self, cell: &str) -> bool {
        self.comment_prefix
            .as_deref()
            .is_some_and(|prefix| cell.starts_with(prefix))
    }

    fn check_row_id(&self, id: &str, row: usize) -> Result<()> {
        if self.is_comment(id) {
            return Err(DatasetError::UnwritableValue {
                row,
                value: id.to_string(),
                reason: "row identifier would be read as a comment",
            });
        }
        Ok(())
    }
}

/// Emit one sentinel row and return the header state that follows it.
fn sentinel_row<W, I>(
    emitter: &mut RowEmitter<W>,
    state: HeaderState,
    sentinel: Sentinel,
    row_names: bool,
    cells: I,
) -> Result<HeaderState>
where
    W: Write,
    I: IntoIterator<Item = String>,
{
    emitter.new_row()?;
    emitter.write_cell(sentinel.keyword())?;
    if row_names {
        emitter.write_cell("")?;
    }
    emitter.write_cells(cells)?;
    Ok(state
        .accept(sentinel.keyword())
        .map_or(HeaderState::Done, |(_, next)| next))
}

/// Write `dataset` to a new file at `path`.
///
/// The format is taken from the file extension when `format` is `None`.
pub fn write<P: AsRef<Path>>(dataset: &Dataset, path: P, format: Option<FileFormat>) -> Result<()> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => FileFormat::from_path(path)?,
    };
    DatasetWriter::new(format).write_path(dataset, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::{DataType, ScaleType};
    use crate::feature::{Feature, RowHeader};
    use crate::scale::Scale;

    fn to_string(dataset: &Dataset, format: FileFormat) -> Result<String> {
        let bytes = DatasetWriter::new(format).write_to(dataset, Vec::new())?;
        Ok(String::from_utf8(bytes).unwrap())
    }

    fn sample() -> Dataset {
        let features = vec![
            Feature::new("colA"),
            Feature::with_scale("colB", Scale::ratio(DataType::Real)),
        ];
        let rows = vec![
            vec![Some(Value::from("x")), Some(Value::Real(5.0))],
            vec![None, Some(Value::Real(-3.5))],
        ];
        let headers = vec![RowHeader::from_id("r1"), RowHeader::from_id("r2")];
        Dataset::from_values("trial", None, features, headers, rows).unwrap()
    }

    #[test]
    fn test_writes_sentinel_rows() {
        let out = to_string(&sample(), FileFormat::Csv).unwrap();
        assert_eq!(
            out,
            "trial,colA,colB\nTYPE,NS,RD\nMIN,,-3.5\nMAX,,5\nr1,x,5\nr2,,-3.5\n"
        );
    }

    #[test]
    fn test_writes_row_and_column_names() {
        let features = vec![Feature::new("a").named("Alpha")];
        let rows = vec![vec![Some(Value::from("v"))]];
        let headers = vec![RowHeader::new(Some("r1"), Some("Row One"))];
        let dataset = Dataset::from_values("ds", None, features, headers, rows).unwrap();

        let out = to_string(&dataset, FileFormat::Txt).unwrap();
        assert_eq!(
            out,
            "ID\tNAME\ta\nNAME\t\tAlpha\nTYPE\t\tNS\nr1\tRow One\tv\n"
        );
    }

    #[test]
    fn test_reserved_dataset_id() {
        let features = vec![Feature::new("a")];
        let rows = vec![vec![None]];
        let dataset =
            Dataset::from_values("ID", None, features, vec![RowHeader::from_id("r1")], rows)
                .unwrap();
        let out = to_string(&dataset, FileFormat::Csv).unwrap();
        assert!(out.starts_with("ID,a\n"));
    }

    #[test]
    fn test_first_column_named_name() {
        let features = vec![Feature::new("NAME")];
        let rows = vec![vec![Some(Value::from("1"))]];
        let dataset = Dataset::from_values(
            "ID",
            None,
            features,
            vec![RowHeader::from_id("r1")],
            rows,
        )
        .unwrap();
        let out = to_string(&dataset, FileFormat::Csv).unwrap();
        assert!(out.starts_with("ID,NAME,NAME\nTYPE,,NS\nr1,r1,1\n"));
    }

    #[test]
    fn test_first_row_named_min_gets_bound_rows() {
        let features = vec![Feature::new("a")];
        let rows = vec![vec![Some(Value::from("v"))]];
        let dataset =
            Dataset::from_values("ds", None, features, vec![RowHeader::from_id("MIN")], rows)
                .unwrap();
        let out = to_string(&dataset, FileFormat::Csv).unwrap();
        assert_eq!(out, "ds,a\nTYPE,NS\nMIN,\nMAX,\nMIN,v\n");
    }

    #[test]
    fn test_rejects_comment_like_row_id() {
        let features = vec![Feature::new("a")];
        let rows = vec![vec![None]];
        let dataset =
            Dataset::from_values("ds", None, features, vec![RowHeader::from_id("#r1")], rows)
                .unwrap();
        let err = to_string(&dataset, FileFormat::Csv).unwrap_err();
        assert!(matches!(err, DatasetError::UnwritableValue { row: 3, .. }));

        let mut writer = DatasetWriter::new(FileFormat::Csv);
        writer.comment_prefix(None);
        assert!(writer.write_to(&dataset, Vec::new()).is_ok());
    }

    #[test]
    fn test_rejects_line_breaks_in_values() {
        let features = vec![Feature::with_scale(
            "a",
            Scale::new(ScaleType::Nominal, DataType::String),
        )];
        let rows = vec![vec![Some(Value::from("two\nlines"))]];
        let dataset =
            Dataset::from_values("ds", None, features, vec![RowHeader::from_id("r1")], rows)
                .unwrap();
        assert!(matches!(
            to_string(&dataset, FileFormat::Csv),
            Err(DatasetError::UnwritableValue { .. })
        ));
    }
}
