//! In-memory datasets and their assembly from parsed rows.

use foldhash::{HashSet, HashSetExt};
use tracing::debug;

use crate::data_type::DataType;
use crate::dsv::convert::Position;
use crate::error::{DatasetError, Result};
use crate::feature::{Feature, RowHeader};
use crate::value::Value;

/// One data row: a value (or absence of one) per column.
pub type Row = Vec<Option<Value>>;

/// A rectangular, feature-annotated dataset.
///
/// Rows keep the order they were read or supplied in. Every row carries one
/// value slot per feature and a [`RowHeader`] with a unique identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    id: String,
    name: String,
    features: Vec<Feature>,
    row_headers: Vec<RowHeader>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Build a dataset from in-memory parts, keeping the given scales as they are.
    ///
    /// Fails if there are no rows, a row does not have one value per feature,
    /// column identifiers repeat, or row identifiers are missing or repeat.
    /// Every value must have its column's data type; integers in a real
    /// column are widened to reals.
    pub fn new(
        id: impl Into<String>,
        name: Option<String>,
        features: Vec<Feature>,
        row_headers: Vec<RowHeader>,
        mut rows: Vec<Row>,
    ) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(DatasetError::InvalidArgument(
                "dataset identifier must not be empty".to_string(),
            ));
        }
        if row_headers.len() != rows.len() {
            return Err(DatasetError::InvalidArgument(format!(
                "{} row headers for {} rows",
                row_headers.len(),
                rows.len()
            )));
        }

        check_column_ids(&features)?;
        if rows.is_empty() {
            return Err(DatasetError::NoValues);
        }
        for (i, row) in rows.iter_mut().enumerate() {
            check_value_count(i + 1, features.len(), row.len())?;
            check_value_types(i + 1, &features, row)?;
        }
        check_row_headers(&row_headers, |i| (i + 1, None))?;

        Ok(Self {
            name: name.unwrap_or_else(|| id.clone()),
            id,
            features,
            row_headers,
            rows,
        })
    }

    /// Build a dataset from in-memory parts, recomputing every scale from the values.
    ///
    /// Scale and data types of the features are kept; bounds and discrete
    /// values are replaced by what the rows contain.
    pub fn from_values(
        id: impl Into<String>,
        name: Option<String>,
        features: Vec<Feature>,
        row_headers: Vec<RowHeader>,
        rows: Vec<Row>,
    ) -> Result<Self> {
        let mut dataset = Self::new(id, name, features, row_headers, rows)?;
        for (col, feature) in dataset.features.iter_mut().enumerate() {
            let scale = feature.scale_mut();
            *scale = scale.empty_like();
            for value in dataset.rows.iter().filter_map(|row| row[col].as_ref()) {
                scale.accumulate(value);
            }
        }
        Ok(dataset)
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Look up a column feature by identifier.
    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id() == id)
    }

    #[inline]
    pub fn row_headers(&self) -> &[RowHeader] {
        &self.row_headers
    }

    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.features.len()
    }

    /// Value at (`row`, `column`); `None` when absent or out of range.
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row)?.get(column)?.as_ref()
    }

    /// Returns true if any row header has a display name distinct from its identifier.
    pub fn has_row_names(&self) -> bool {
        self.row_headers.iter().any(RowHeader::has_distinct_name)
    }

    /// Iterate over (row header, row) pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&RowHeader, &Row)> {
        self.row_headers.iter().zip(self.rows.iter())
    }
}

fn check_column_ids(features: &[Feature]) -> Result<()> {
    let mut seen = HashSet::with_capacity(features.len());
    for feature in features {
        if !seen.insert(feature.id()) {
            return Err(DatasetError::DuplicateColumnId(feature.id().to_string()));
        }
        if !feature.scale_type().accepts(feature.data_type()) {
            return Err(DatasetError::IncompatibleScale {
                column: feature.id().to_string(),
                scale: feature.scale_type(),
                data_type: feature.data_type(),
            });
        }
    }
    Ok(())
}

/// Values must carry their column's data type; integers widen into real columns.
fn check_value_types(row: usize, features: &[Feature], values: &mut Row) -> Result<()> {
    for (col, (feature, slot)) in features.iter().zip(values.iter_mut()).enumerate() {
        let Some(value) = slot.take() else { continue };
        let expected = feature.data_type();
        let value = match (value.data_type(), expected) {
            (actual, expected) if actual == expected => value,
            (DataType::Integer, DataType::Real) => value.widen(DataType::Real),
            _ => {
                return Err(DatasetError::ValueType {
                    row,
                    column: col + 1,
                    value: value.to_string(),
                    expected,
                });
            }
        };
        *slot = Some(value);
    }
    Ok(())
}

fn check_value_count(row: usize, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DatasetError::ValueCount {
            row,
            expected,
            actual,
        })
    }
}

/// Every row must carry an identifier and identifiers must be distinct.
/// `locate` maps a row index to the row and source line reported in errors.
fn check_row_headers(
    headers: &[RowHeader],
    locate: impl Fn(usize) -> (usize, Option<u64>),
) -> Result<()> {
    let mut seen = HashSet::with_capacity(headers.len());
    for (i, header) in headers.iter().enumerate() {
        let Some(id) = header.id() else {
            let (row, line) = locate(i);
            return Err(DatasetError::MissingRowId { row, line });
        };
        if !seen.insert(id) {
            let (row, line) = locate(i);
            return Err(DatasetError::DuplicateRowId {
                id: id.to_string(),
                row,
                line,
            });
        }
    }
    Ok(())
}

/// Collects converted rows into a [`Dataset`], folding each value into its
/// column's scale as it arrives.
#[derive(Debug)]
pub(crate) struct DatasetAssembler {
    id: String,
    name: Option<String>,
    features: Vec<Feature>,
    /// Observed type per column whose data type is inferred rather than declared.
    inferred: Vec<Option<Option<DataType>>>,
    /// Source text of non-string values in inferred columns, per column then row.
    tokens: Vec<Vec<Option<String>>>,
    row_headers: Vec<RowHeader>,
    rows: Vec<Row>,
    positions: Vec<Position>,
}

impl DatasetAssembler {
    /// `inferred[c]` marks columns whose data type should be derived from the values.
    pub(crate) fn new(
        id: String,
        name: Option<String>,
        features: Vec<Feature>,
        inferred: &[bool],
    ) -> Result<Self> {
        check_column_ids(&features)?;
        Ok(Self {
            id,
            name,
            inferred: inferred.iter().map(|&i| i.then_some(None)).collect(),
            tokens: vec![Vec::new(); features.len()],
            features,
            row_headers: Vec::new(),
            rows: Vec::new(),
            positions: Vec::new(),
        })
    }

    /// Returns true if `column` takes its data type from the values.
    pub(crate) fn is_inferred(&self, column: usize) -> bool {
        matches!(self.inferred.get(column), Some(Some(_)))
    }

    /// Append one row read at `at`.
    ///
    /// `tokens` holds the source text of each cell; it is kept for inferred
    /// columns so a column that settles on strings keeps the original text.
    pub(crate) fn push_row(
        &mut self,
        at: Position,
        header: RowHeader,
        row: Row,
        tokens: Vec<String>,
    ) -> Result<()> {
        check_value_count(at.row, self.features.len(), row.len())?;

        let mut tokens = tokens.into_iter();
        for (col, value) in row.iter().enumerate() {
            let token = tokens.next();
            let Some(Some(observed)) = self.inferred.get_mut(col) else {
                if let Some(value) = value {
                    self.features[col].scale_mut().accumulate(value);
                }
                continue;
            };
            let raw = match value {
                Some(value) => {
                    let data_type = value.data_type();
                    *observed = Some(observed.map_or(data_type, |t| t.merge(data_type)));
                    token.filter(|_| data_type != DataType::String)
                }
                None => None,
            };
            self.tokens[col].push(raw);
            if let Some(value) = value {
                self.features[col].scale_mut().accumulate(value);
            }
        }

        self.row_headers.push(header);
        self.rows.push(row);
        self.positions.push(at);
        Ok(())
    }

    /// Validate the collected rows and produce the dataset.
    pub(crate) fn finish(mut self) -> Result<Dataset> {
        if self.rows.is_empty() {
            return Err(DatasetError::NoValues);
        }
        let positions = &self.positions;
        check_row_headers(&self.row_headers, |i| {
            (positions[i].row, Some(positions[i].line))
        })?;

        for col in 0..self.features.len() {
            if let Some(Some(observed)) = self.inferred[col] {
                self.settle_inferred_column(col, observed);
            }
        }

        debug!(
            dataset = %self.id,
            rows = self.rows.len(),
            columns = self.features.len(),
            "assembled dataset"
        );

        Ok(Dataset {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            features: self.features,
            row_headers: self.row_headers,
            rows: self.rows,
        })
    }

    /// Give an inferred column its merged data type.
    ///
    /// Integers widen to reals numerically. In a column that settles on
    /// strings every other value is replaced by its source text.
    fn settle_inferred_column(&mut self, col: usize, observed: DataType) {
        let mixed = self
            .rows
            .iter()
            .filter_map(|row| row[col].as_ref())
            .any(|v| v.data_type() != observed);

        let tokens = std::mem::take(&mut self.tokens[col]);
        let scale = self.features[col].scale_mut();
        scale.retype(observed);
        for (row, token) in self.rows.iter_mut().zip(tokens) {
            if mixed && let Some(value) = row[col].take() {
                row[col] = Some(match (observed, token) {
                    (DataType::String, Some(token)) => Value::String(token),
                    _ => value.widen(observed),
                });
            }
            if let Some(value) = row[col].as_ref() {
                scale.accumulate(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_type::ScaleType;
    use crate::scale::Scale;

    fn headers(ids: &[&str]) -> Vec<RowHeader> {
        ids.iter().map(|id| RowHeader::from_id(id)).collect()
    }

    #[test]
    fn test_new_validates_value_count() {
        let features = vec![Feature::new("a"), Feature::new("b")];
        let rows = vec![vec![Some(Value::from("x"))]];
        let err = Dataset::new("ds", None, features, headers(&["r1"]), rows).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::ValueCount {
                row: 1,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_row_ids() {
        let features = vec![Feature::new("a")];
        let rows = vec![vec![None], vec![None]];
        let err = Dataset::new("ds", None, features, headers(&["r1", "r1"]), rows).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::DuplicateRowId {
                row: 2,
                line: None,
                ..
            }
        ));
    }

    #[test]
    fn test_new_rejects_missing_row_ids() {
        let features = vec![Feature::new("a")];
        let rows = vec![vec![None], vec![None]];
        let row_headers = vec![RowHeader::from_id("r1"), RowHeader::new(None, None)];
        let err = Dataset::new("ds", None, features, row_headers, rows).unwrap_err();
        assert!(matches!(err, DatasetError::MissingRowId { row: 2, line: None }));
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = Dataset::new("ds", None, vec![Feature::new("a")], vec![], vec![]).unwrap_err();
        assert!(matches!(err, DatasetError::NoValues));
    }

    #[test]
    fn test_from_values_recomputes_scales() {
        let features = vec![Feature::with_scale(
            "v",
            Scale::new(ScaleType::Interval, DataType::Integer),
        )];
        let rows = vec![
            vec![Some(Value::Integer(4))],
            vec![None],
            vec![Some(Value::Integer(-2))],
        ];
        let dataset =
            Dataset::from_values("ds", None, features, headers(&["a", "b", "c"]), rows).unwrap();
        let scale = dataset.features()[0].scale();
        assert_eq!(scale.minimum(), Some(&Value::Integer(-2)));
        assert_eq!(scale.maximum(), Some(&Value::Integer(4)));
        assert_eq!(dataset.name(), "ds");
    }

    #[test]
    fn test_new_rejects_values_of_another_type() {
        let features = vec![Feature::new("n")];
        let rows = vec![vec![Some(Value::Integer(1))]];
        let err = Dataset::new("ds", None, features, headers(&["r1"]), rows).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::ValueType {
                row: 1,
                column: 1,
                expected: DataType::String,
                ..
            }
        ));

        let features = vec![Feature::with_scale("size", Scale::ratio(DataType::Real))];
        let rows = vec![vec![Some(Value::Real(1.5))], vec![Some(Value::from("abc"))]];
        let err =
            Dataset::from_values("ds", None, features, headers(&["r1", "r2"]), rows).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::ValueType {
                row: 2,
                column: 1,
                expected: DataType::Real,
                ..
            }
        ));
    }

    #[test]
    fn test_new_widens_integers_in_real_columns() {
        let features = vec![Feature::with_scale("size", Scale::ratio(DataType::Real))];
        let rows = vec![vec![Some(Value::Integer(3))]];
        let dataset = Dataset::from_values("ds", None, features, headers(&["r1"]), rows).unwrap();
        assert_eq!(dataset.value(0, 0), Some(&Value::Real(3.0)));
        assert_eq!(dataset.features()[0].scale().maximum(), Some(&Value::Real(3.0)));
    }

    #[test]
    fn test_new_rejects_incompatible_scale() {
        let features = vec![Feature::with_scale("s", Scale::ratio(DataType::String))];
        let rows = vec![vec![Some(Value::from("x"))]];
        let err = Dataset::new("ds", None, features, headers(&["r1"]), rows).unwrap_err();
        assert!(matches!(err, DatasetError::IncompatibleScale { .. }));
    }

    fn cells(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_assembler_widens_mixed_inferred_column() {
        let features = vec![Feature::new("n"), Feature::new("m")];
        let mut assembler =
            DatasetAssembler::new("ds".into(), None, features, &[true, true]).unwrap();
        assembler
            .push_row(
                Position::new(2, 2),
                RowHeader::from_id("r1"),
                vec![Some(Value::Integer(1)), Some(Value::Integer(7))],
                cells(&["1", "007"]),
            )
            .unwrap();
        assembler
            .push_row(
                Position::new(3, 3),
                RowHeader::from_id("r2"),
                vec![Some(Value::Real(2.5)), Some(Value::from("x"))],
                cells(&["2.5", "x"]),
            )
            .unwrap();
        let dataset = assembler.finish().unwrap();

        assert_eq!(dataset.features()[0].data_type(), DataType::Real);
        assert_eq!(dataset.value(0, 0), Some(&Value::Real(1.0)));
        assert_eq!(dataset.features()[1].data_type(), DataType::String);
        assert_eq!(dataset.value(0, 1), Some(&Value::from("007")));
        let values = dataset.features()[1].scale().values().unwrap();
        assert!(values.contains(&Value::from("007")));
        assert!(values.contains(&Value::from("x")));
    }

    #[test]
    fn test_assembler_keeps_values_of_uniform_columns() {
        let mut assembler =
            DatasetAssembler::new("ds".into(), None, vec![Feature::new("n")], &[true]).unwrap();
        assert!(assembler.is_inferred(0));
        assembler
            .push_row(
                Position::new(2, 2),
                RowHeader::from_id("r1"),
                vec![Some(Value::Integer(7))],
                cells(&["007"]),
            )
            .unwrap();
        let dataset = assembler.finish().unwrap();
        assert_eq!(dataset.features()[0].data_type(), DataType::Integer);
        assert_eq!(dataset.value(0, 0), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_assembler_reports_source_row() {
        let mut assembler =
            DatasetAssembler::new("ds".into(), None, vec![Feature::new("a")], &[true]).unwrap();
        assembler
            .push_row(
                Position::new(4, 5),
                RowHeader::from_id("r1"),
                vec![None],
                cells(&[""]),
            )
            .unwrap();
        assembler
            .push_row(
                Position::new(6, 9),
                RowHeader::from_id("r1"),
                vec![None],
                cells(&[""]),
            )
            .unwrap();
        let err = assembler.finish().unwrap_err();
        assert!(matches!(
            err,
            DatasetError::DuplicateRowId {
                row: 6,
                line: Some(9),
                ..
            }
        ));
    }

    #[test]
    fn test_assembler_no_values() {
        let assembler =
            DatasetAssembler::new("ds".into(), None, vec![Feature::new("a")], &[true]).unwrap();
        assert_eq!(
            assembler.finish().unwrap_err().to_string(),
            "the data has no values"
        );
    }
}
