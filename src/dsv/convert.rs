//! Typed cell conversion.
//!
//! A raw token is converted by attempting each allowed [`DataType`] in a fixed
//! priority order (integer, real, boolean, date, string) and accepting the
//! first that parses. Allowed types come from a [`ConversionTypes`] mask,
//! either one mask for every column or a per-column override.

use std::fmt;
use std::ops::BitOr;

use chrono::NaiveDate;
use foldhash::HashMap;

use super::patterns::{DATE_ISO_PATTERN, FLOAT_PATTERN, NON_FINITE_PATTERN};
use crate::data_type::DataType;
use crate::error::{DatasetError, Result};
use crate::value::{DATE_FORMAT, Value};

/// Bitmask of data types a cell may be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionTypes(u8);

impl ConversionTypes {
    pub const STRING: ConversionTypes = ConversionTypes(1);
    pub const INTEGER: ConversionTypes = ConversionTypes(1 << 1);
    pub const REAL: ConversionTypes = ConversionTypes(1 << 2);
    pub const BOOLEAN: ConversionTypes = ConversionTypes(1 << 3);
    pub const DATE: ConversionTypes = ConversionTypes(1 << 4);
    /// Every type: best-effort inference with string fallback.
    pub const INFER: ConversionTypes = ConversionTypes(0b1_1111);

    /// Mask allowing exactly `data_type`.
    pub const fn of(data_type: DataType) -> ConversionTypes {
        match data_type {
            DataType::String => Self::STRING,
            DataType::Integer => Self::INTEGER,
            DataType::Real => Self::REAL,
            DataType::Boolean => Self::BOOLEAN,
            DataType::Date => Self::DATE,
        }
    }

    #[inline]
    pub const fn contains(&self, data_type: DataType) -> bool {
        self.0 & Self::of(data_type).0 != 0
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Allowed types in conversion priority order.
    pub fn types(&self) -> impl Iterator<Item = DataType> + '_ {
        DataType::ALL.into_iter().filter(|t| self.contains(*t))
    }
}

impl Default for ConversionTypes {
    fn default() -> Self {
        Self::INFER
    }
}

impl BitOr for ConversionTypes {
    type Output = ConversionTypes;

    fn bitor(self, rhs: Self) -> Self::Output {
        ConversionTypes(self.0 | rhs.0)
    }
}

impl From<DataType> for ConversionTypes {
    fn from(data_type: DataType) -> Self {
        Self::of(data_type)
    }
}

impl fmt::Display for ConversionTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, data_type) in self.types().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{data_type}")?;
        }
        Ok(())
    }
}

/// Source coordinates of a row: its row count and its physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 1-based row, counting only rows that were not skipped.
    pub row: usize,
    /// 1-based physical line in the source.
    pub line: u64,
}

impl Position {
    pub const fn new(row: usize, line: u64) -> Self {
        Self { row, line }
    }
}

/// Column-indexed converter from raw tokens to typed values.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    default_types: ConversionTypes,
    column_types: HashMap<usize, ConversionTypes>,
    preserve_empty_strings: bool,
}

impl Converter {
    /// Create a converter applying `default_types` to every column.
    pub fn new(default_types: ConversionTypes) -> Self {
        Self {
            default_types,
            ..Self::default()
        }
    }

    /// Replace the mask applied to columns without an override.
    pub fn default_types(&mut self, types: ConversionTypes) -> &mut Self {
        self.default_types = types;
        self
    }

    /// Keep empty tokens as empty strings in columns that allow strings.
    pub fn preserve_empty_strings(&mut self, preserve: bool) -> &mut Self {
        self.preserve_empty_strings = preserve;
        self
    }

    /// Override the allowed types for one column.
    pub fn column_types(&mut self, column: usize, types: ConversionTypes) -> &mut Self {
        self.column_types.insert(column, types);
        self
    }

    /// Set the allowed types for `column` unless an override already exists.
    pub fn declare_column_types(&mut self, column: usize, types: ConversionTypes) -> &mut Self {
        self.column_types.entry(column).or_insert(types);
        self
    }

    /// Allowed types for `column`; a per-column mask wins over the default.
    pub fn types_for(&self, column: usize) -> ConversionTypes {
        self.column_types
            .get(&column)
            .copied()
            .unwrap_or(self.default_types)
    }

    /// Convert the token found in `column` of the row at `at`.
    ///
    /// Returns `Ok(None)` for empty or whitespace-only tokens. `column` is the
    /// zero-based data column; errors report it one-based.
    pub fn convert(&self, token: &str, at: Position, column: usize) -> Result<Option<Value>> {
        self.convert_with(token, self.types_for(column), at, column)
    }

    /// Convert a token to exactly `data_type`.
    pub fn convert_as(
        &self,
        token: &str,
        data_type: DataType,
        at: Position,
        column: usize,
    ) -> Result<Option<Value>> {
        self.convert_with(token, ConversionTypes::of(data_type), at, column)
    }

    fn convert_with(
        &self,
        token: &str,
        types: ConversionTypes,
        at: Position,
        column: usize,
    ) -> Result<Option<Value>> {
        if token.trim().is_empty() {
            if self.preserve_empty_strings && types.contains(DataType::String) {
                return Ok(Some(Value::String(token.to_string())));
            }
            return Ok(None);
        }

        types
            .types()
            .find_map(|data_type| parse_as(token, data_type))
            .map(Some)
            .ok_or_else(|| DatasetError::Conversion {
                row: at.row,
                line: at.line,
                column: column + 1,
                value: token.to_string(),
                expected: types.to_string(),
            })
    }
}

/// Parse a non-empty token as `data_type`.
pub fn parse_as(token: &str, data_type: DataType) -> Option<Value> {
    let trimmed = token.trim();
    match data_type {
        DataType::String => Some(Value::String(token.to_string())),
        DataType::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
        DataType::Real => {
            if FLOAT_PATTERN.is_match(trimmed) || NON_FINITE_PATTERN.is_match(trimmed) {
                trimmed.parse::<f64>().ok().map(Value::Real)
            } else {
                None
            }
        }
        DataType::Boolean => {
            if trimmed.eq_ignore_ascii_case("true") {
                Some(Value::Boolean(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Some(Value::Boolean(false))
            } else {
                None
            }
        }
        DataType::Date => {
            if !DATE_ISO_PATTERN.is_match(trimmed) {
                return None;
            }
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d"))
                .ok()
                .map(Value::Date)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AT: Position = Position::new(1, 1);

    #[test]
    fn test_inference_order() {
        let converter = Converter::default();
        assert_eq!(
            converter.convert("42", AT, 0).unwrap(),
            Some(Value::Integer(42))
        );
        assert_eq!(
            converter.convert("-3.5", AT, 0).unwrap(),
            Some(Value::Real(-3.5))
        );
        assert_eq!(
            converter.convert("TRUE", AT, 0).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            converter.convert("2023-01-15", AT, 0).unwrap(),
            Some(Value::Date(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()))
        );
        assert_eq!(
            converter.convert("hello", AT, 0).unwrap(),
            Some(Value::from("hello"))
        );
    }

    #[test]
    fn test_empty_tokens() {
        let mut converter = Converter::default();
        assert_eq!(converter.convert("", AT, 0).unwrap(), None);
        assert_eq!(converter.convert("   ", AT, 0).unwrap(), None);

        converter.preserve_empty_strings(true);
        assert_eq!(converter.convert("", AT, 0).unwrap(), Some(Value::from("")));

        converter.column_types(1, ConversionTypes::REAL);
        assert_eq!(converter.convert("", AT, 1).unwrap(), None);
    }

    #[test]
    fn test_column_mask_overrides_default() {
        let mut converter = Converter::new(ConversionTypes::INTEGER | ConversionTypes::STRING);
        converter.column_types(2, ConversionTypes::REAL);

        assert_eq!(converter.convert("7", AT, 0).unwrap(), Some(Value::Integer(7)));
        assert_eq!(converter.convert("7", AT, 2).unwrap(), Some(Value::Real(7.0)));
        assert_eq!(converter.convert("2.5", AT, 0).unwrap(), Some(Value::from("2.5")));
    }

    #[test]
    fn test_declared_types_do_not_replace_overrides() {
        let mut converter = Converter::default();
        converter.column_types(0, ConversionTypes::STRING);
        converter.declare_column_types(0, ConversionTypes::INTEGER);
        converter.declare_column_types(1, ConversionTypes::INTEGER);
        assert_eq!(converter.types_for(0), ConversionTypes::STRING);
        assert_eq!(converter.types_for(1), ConversionTypes::INTEGER);
        assert_eq!(converter.types_for(2), ConversionTypes::INFER);
    }

    #[test]
    fn test_conversion_error_carries_position() {
        let mut converter = Converter::default();
        converter.column_types(1, ConversionTypes::INTEGER | ConversionTypes::REAL);

        let err = converter.convert("abc", Position::new(7, 9), 1).unwrap_err();
        match err {
            DatasetError::Conversion {
                row,
                line,
                column,
                value,
                expected,
            } => {
                assert_eq!(row, 7);
                assert_eq!(line, 9);
                assert_eq!(column, 2);
                assert_eq!(value, "abc");
                assert_eq!(expected, "INTEGER|REAL");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_convert_as() {
        let converter = Converter::default();
        assert_eq!(
            converter.convert_as("0.0", DataType::Real, Position::new(3, 4), 1).unwrap(),
            Some(Value::Real(0.0))
        );
        assert_eq!(
            converter.convert_as("5", DataType::Real, Position::new(3, 4), 1).unwrap(),
            Some(Value::Real(5.0))
        );
        assert!(converter.convert_as("x", DataType::Date, Position::new(3, 4), 1).is_err());
    }

    #[test]
    fn test_non_finite_reals() {
        assert!(matches!(parse_as("NaN", DataType::Real), Some(Value::Real(r)) if r.is_nan()));
        assert_eq!(
            parse_as("-inf", DataType::Real),
            Some(Value::Real(f64::NEG_INFINITY))
        );
        assert_eq!(parse_as("info", DataType::Real), None);
    }
}
