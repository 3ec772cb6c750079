//! Header row detection and column feature inference.
//!
//! The first row names the columns. It is followed by up to four optional
//! sentinel rows, recognized by their first cell, that must appear in the
//! order NAME, TYPE, MIN, MAX. MIN is only recognized after TYPE and MAX only
//! after MIN. The first row that is not the next acceptable sentinel ends
//! detection and is the first data row.

use std::fmt;
use std::io::BufRead;

use tracing::debug;

use super::convert::{ConversionTypes, Converter, Position};
use super::cursor::RowCursor;
use crate::data_type::parse_type_code;
use crate::error::{DatasetError, Result};
use crate::feature::Feature;
use crate::scale::Scale;

/// Reserved first-cell keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    Id,
    Name,
    Type,
    Min,
    Max,
}

impl Sentinel {
    pub const fn keyword(&self) -> &'static str {
        match self {
            Sentinel::Id => "ID",
            Sentinel::Name => "NAME",
            Sentinel::Type => "TYPE",
            Sentinel::Min => "MIN",
            Sentinel::Max => "MAX",
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Position in the sentinel sequence following the identifier row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    ExpectName,
    ExpectType,
    ExpectMin,
    ExpectMax,
    Done,
}

impl HeaderState {
    /// Transition on the first cell of the next row.
    ///
    /// Returns the recognized sentinel and the following state, or `None`
    /// when the row is not an acceptable sentinel and detection ends.
    pub fn accept(self, first_cell: &str) -> Option<(Sentinel, HeaderState)> {
        use HeaderState::{Done, ExpectMax, ExpectMin, ExpectName, ExpectType};

        match (self, first_cell.trim()) {
            (ExpectName, "NAME") => Some((Sentinel::Name, ExpectType)),
            (ExpectName | ExpectType, "TYPE") => Some((Sentinel::Type, ExpectMin)),
            (ExpectMin, "MIN") => Some((Sentinel::Min, ExpectMax)),
            (ExpectMax, "MAX") => Some((Sentinel::Max, Done)),
            _ => None,
        }
    }
}

/// Shape of the identifier row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    /// Dataset identifier, when the first cell was not `ID`.
    pub dataset_id: Option<String>,
    /// Whether data rows carry a display name after their identifier.
    pub has_row_names: bool,
    /// Column identifiers, left to right.
    pub column_ids: Vec<String>,
}

impl HeaderLayout {
    /// Interpret the identifier row.
    pub fn parse(cells: &[String]) -> Result<HeaderLayout> {
        let first = cells.first().ok_or(DatasetError::MissingHeader)?;

        let (dataset_id, has_row_names) = if first.trim() == Sentinel::Id.keyword() {
            let names = cells
                .get(1)
                .is_some_and(|c| c.trim() == Sentinel::Name.keyword());
            (None, names)
        } else {
            (Some(first.trim().to_string()), false)
        };

        let offset = if has_row_names { 2 } else { 1 };
        let column_ids: Vec<String> = cells[offset..]
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        if let Some(column) = column_ids.iter().position(String::is_empty) {
            return Err(DatasetError::MissingColumnId { column: column + 1 });
        }

        Ok(HeaderLayout {
            dataset_id,
            has_row_names,
            column_ids,
        })
    }

    /// Index of the first value cell in a data row.
    #[inline]
    pub fn data_offset(&self) -> usize {
        if self.has_row_names { 2 } else { 1 }
    }

    #[inline]
    pub fn num_columns(&self) -> usize {
        self.column_ids.len()
    }
}

/// Everything header detection learned about the columns.
#[derive(Debug)]
pub struct DetectedHeader {
    pub layout: HeaderLayout,
    pub features: Vec<Feature>,
    /// Columns whose data type is left to inference from the values.
    pub inferred: Vec<bool>,
    /// The cursor already sits on the first data row.
    pub data_row_pending: bool,
}

/// Consume the header rows under `cursor`.
///
/// Declared column types are registered with `converter`; `element` seeds the
/// scale of every column the file does not type itself.
pub fn detect_header<R: BufRead>(
    cursor: &mut RowCursor<R>,
    converter: &mut Converter,
    element: Option<&Feature>,
) -> Result<DetectedHeader> {
    if !cursor.next_row()? {
        return Err(DatasetError::MissingHeader);
    }
    let layout = HeaderLayout::parse(cursor.cells()?)?;
    debug!(
        columns = layout.num_columns(),
        row_names = layout.has_row_names,
        dataset = layout.dataset_id.as_deref().unwrap_or(""),
        "read identifier row"
    );

    let mut features: Vec<Feature> = layout.column_ids.iter().map(Feature::new).collect();
    let mut typed = vec![false; features.len()];
    let mut state = HeaderState::ExpectName;
    let mut data_row_pending = false;

    while state != HeaderState::Done && cursor.has_next_row()? {
        cursor.advance()?;
        let Some((sentinel, next)) = state.accept(cursor.cell(0)?) else {
            cursor.enforce_row_size()?;
            data_row_pending = true;
            break;
        };
        debug!(sentinel = %sentinel, line = cursor.line_number(), "read sentinel row");

        let values = sentinel_values(cursor, sentinel, features.len())?;
        match sentinel {
            Sentinel::Name => apply_names(&mut features, values),
            Sentinel::Type => {
                apply_types(&mut features, values)?;
                typed.fill(true);
            }
            Sentinel::Min | Sentinel::Max => {
                apply_bounds(&mut features, values, sentinel, converter, cursor.position())?;
            }
            Sentinel::Id => {}
        }
        state = next;
    }

    if let Some(element) = element {
        for (feature, typed) in features.iter_mut().zip(typed.iter_mut()) {
            if !*typed {
                *feature.scale_mut() = element.scale().empty_like();
                *typed = true;
            }
        }
    }

    for (column, feature) in features.iter().enumerate() {
        if typed[column] {
            converter.declare_column_types(column, ConversionTypes::of(feature.data_type()));
        }
    }

    Ok(DetectedHeader {
        inferred: typed.iter().map(|t| !t).collect(),
        layout,
        features,
        data_row_pending,
    })
}

/// Value cells of a sentinel row holding `columns` values.
///
/// The cell after the keyword is a blank placeholder when the row has
/// `2 + columns` cells and absent when it has `1 + columns`.
fn sentinel_values<'a, R: BufRead>(
    cursor: &'a RowCursor<R>,
    sentinel: Sentinel,
    columns: usize,
) -> Result<Vec<&'a str>> {
    let cells = cursor.cells()?;
    let offset = if cells.len() == columns + 2 {
        2
    } else if cells.len() == columns + 1 {
        1
    } else {
        return Err(DatasetError::SentinelWidth {
            sentinel: sentinel.keyword(),
            line: cursor.line_number(),
            columns,
            actual: cells.len(),
        });
    };
    Ok(cells[offset..].iter().map(String::as_str).collect())
}

fn apply_names(features: &mut [Feature], names: Vec<&str>) {
    for (feature, name) in features.iter_mut().zip(names) {
        feature.set_name(name.trim());
    }
}

fn apply_types(features: &mut [Feature], codes: Vec<&str>) -> Result<()> {
    for (feature, code) in features.iter_mut().zip(codes) {
        let (scale_type, data_type) =
            parse_type_code(code).ok_or_else(|| DatasetError::UnknownTypeCode {
                code: code.trim().to_string(),
                column: feature.id().to_string(),
            })?;
        if !scale_type.accepts(data_type) {
            return Err(DatasetError::IncompatibleScale {
                column: feature.id().to_string(),
                scale: scale_type,
                data_type,
            });
        }
        *feature.scale_mut() = Scale::new(scale_type, data_type);
    }
    Ok(())
}

fn apply_bounds(
    features: &mut [Feature],
    cells: Vec<&str>,
    sentinel: Sentinel,
    converter: &Converter,
    at: Position,
) -> Result<()> {
    for (column, (feature, cell)) in features.iter_mut().zip(cells).enumerate() {
        if cell.trim().is_empty() {
            continue;
        }
        if !feature.scale_type().has_bounds() {
            return Err(DatasetError::BoundOnNominal {
                column: feature.id().to_string(),
                sentinel: sentinel.keyword(),
            });
        }
        let Some(value) = converter.convert_as(cell, feature.data_type(), at, column)? else {
            continue;
        };
        let scale = feature.scale_mut();
        if sentinel == Sentinel::Min {
            scale.set_minimum(value);
        } else {
            scale.set_maximum(value);
        }
    }
    Ok(())
}
