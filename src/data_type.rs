use std::fmt;

use serde::Serialize;

/// Storage/conversion type of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Free text (fallback type).
    #[default]
    String,
    /// Signed whole number.
    Integer,
    /// Floating point number.
    Real,
    /// `true` / `false`.
    Boolean,
    /// Calendar date without time component.
    Date,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::String => write!(f, "STRING"),
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Real => write!(f, "REAL"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Date => write!(f, "DATE"),
        }
    }
}

impl DataType {
    /// All data types in conversion priority order.
    pub const ALL: [DataType; 5] = [
        DataType::Integer,
        DataType::Real,
        DataType::Boolean,
        DataType::Date,
        DataType::String,
    ];

    /// Returns true if this type is numeric.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Real)
    }

    /// Returns the conversion priority. Lower values are attempted first.
    pub const fn priority(&self) -> u8 {
        match self {
            DataType::Integer => 0,
            DataType::Real => 1,
            DataType::Boolean => 2,
            DataType::Date => 3,
            DataType::String => 4,
        }
    }

    /// Abbreviation used in the second position of a TYPE code.
    pub const fn code(&self) -> char {
        match self {
            DataType::String => 'S',
            DataType::Integer => 'I',
            DataType::Real => 'D',
            DataType::Boolean => 'B',
            DataType::Date => 'T',
        }
    }

    /// Decode a data type abbreviation. `N` is also read as integer, `R` and
    /// `F` as real.
    pub fn from_code(code: char) -> Option<DataType> {
        match code.to_ascii_uppercase() {
            'S' => Some(DataType::String),
            'I' | 'N' => Some(DataType::Integer),
            'D' | 'R' | 'F' => Some(DataType::Real),
            'B' => Some(DataType::Boolean),
            'T' => Some(DataType::Date),
            _ => None,
        }
    }

    /// Merge two types, returning the most general type that can represent both.
    pub fn merge(self, other: DataType) -> DataType {
        match (self, other) {
            (a, b) if a == b => a,
            (DataType::Integer, DataType::Real) | (DataType::Real, DataType::Integer) => {
                DataType::Real
            }
            _ => DataType::String,
        }
    }
}

/// Statistical scale classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleType {
    /// Unordered categories.
    #[default]
    Nominal,
    /// Ordered categories.
    Ordinal,
    /// Numeric values without a true zero.
    Interval,
    /// Numeric values with a true zero and no enumerable value set.
    Ratio,
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaleType::Nominal => write!(f, "NOMINAL"),
            ScaleType::Ordinal => write!(f, "ORDINAL"),
            ScaleType::Interval => write!(f, "INTERVAL"),
            ScaleType::Ratio => write!(f, "RATIO"),
        }
    }
}

impl ScaleType {
    /// Abbreviation used in the first position of a TYPE code.
    pub const fn code(&self) -> char {
        match self {
            ScaleType::Nominal => 'N',
            ScaleType::Ordinal => 'O',
            ScaleType::Interval => 'I',
            ScaleType::Ratio => 'R',
        }
    }

    /// Decode a scale abbreviation; `S` is an alias for nominal.
    pub fn from_code(code: char) -> Option<ScaleType> {
        match code.to_ascii_uppercase() {
            'N' | 'S' => Some(ScaleType::Nominal),
            'O' => Some(ScaleType::Ordinal),
            'I' => Some(ScaleType::Interval),
            'R' => Some(ScaleType::Ratio),
            _ => None,
        }
    }

    /// Data type used when a TYPE code names only the scale.
    pub const fn default_data_type(&self) -> DataType {
        match self {
            ScaleType::Nominal => DataType::String,
            ScaleType::Ordinal => DataType::Integer,
            ScaleType::Interval | ScaleType::Ratio => DataType::Real,
        }
    }

    /// Returns true if the scale tracks minimum/maximum bounds.
    #[inline]
    pub fn has_bounds(&self) -> bool {
        matches!(self, ScaleType::Interval | ScaleType::Ratio)
    }

    /// Returns true if the scale tracks a discrete value set.
    #[inline]
    pub fn has_discrete_values(&self) -> bool {
        matches!(self, ScaleType::Nominal | ScaleType::Ordinal)
    }

    /// Returns true if values of `data_type` can live on this scale.
    pub fn accepts(&self, data_type: DataType) -> bool {
        match self {
            ScaleType::Nominal | ScaleType::Ordinal => true,
            ScaleType::Interval => data_type.is_numeric() || data_type == DataType::Date,
            ScaleType::Ratio => data_type.is_numeric(),
        }
    }
}

/// Decode a TYPE code of the form `<ScaleTypeChar><DataTypeChar>`.
///
/// An empty code means nominal strings, a single character names the scale
/// and takes its default data type. Returns `None` for anything else.
pub fn parse_type_code(code: &str) -> Option<(ScaleType, DataType)> {
    let mut chars = code.trim().chars();
    match (chars.next(), chars.next(), chars.next()) {
        (None, _, _) => Some((ScaleType::Nominal, ScaleType::Nominal.default_data_type())),
        (Some(s), None, _) => {
            let scale = ScaleType::from_code(s)?;
            Some((scale, scale.default_data_type()))
        }
        (Some(s), Some(d), None) => Some((ScaleType::from_code(s)?, DataType::from_code(d)?)),
        _ => None,
    }
}

/// Encode a scale/data type pair as a TYPE code.
pub fn type_code(scale: ScaleType, data_type: DataType) -> String {
    let mut code = String::with_capacity(2);
    code.push(scale.code());
    code.push(data_type.code());
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_merge() {
        assert_eq!(DataType::Integer.merge(DataType::Integer), DataType::Integer);
        assert_eq!(DataType::Integer.merge(DataType::Real), DataType::Real);
        assert_eq!(DataType::Real.merge(DataType::Integer), DataType::Real);
        assert_eq!(DataType::Boolean.merge(DataType::Integer), DataType::String);
        assert_eq!(DataType::Date.merge(DataType::String), DataType::String);
    }

    #[test]
    fn test_parse_type_code() {
        assert_eq!(
            parse_type_code("NS"),
            Some((ScaleType::Nominal, DataType::String))
        );
        assert_eq!(parse_type_code("RD"), Some((ScaleType::Ratio, DataType::Real)));
        assert_eq!(parse_type_code("it"), Some((ScaleType::Interval, DataType::Date)));
        assert_eq!(parse_type_code("O"), Some((ScaleType::Ordinal, DataType::Integer)));
        assert_eq!(parse_type_code(""), Some((ScaleType::Nominal, DataType::String)));
        assert_eq!(parse_type_code("XS"), None);
        assert_eq!(parse_type_code("NQ"), None);
        assert_eq!(parse_type_code("IN"), Some((ScaleType::Interval, DataType::Integer)));
        assert_eq!(parse_type_code("SB"), Some((ScaleType::Nominal, DataType::Boolean)));
        assert_eq!(parse_type_code("NSS"), None);
    }

    #[test]
    fn test_type_code() {
        assert_eq!(type_code(ScaleType::Ratio, DataType::Real), "RD");
        assert_eq!(type_code(ScaleType::Interval, DataType::Date), "IT");
        assert_eq!(type_code(ScaleType::Nominal, DataType::Boolean), "NB");
    }

    #[test]
    fn test_scale_accepts() {
        assert!(ScaleType::Nominal.accepts(DataType::Boolean));
        assert!(ScaleType::Interval.accepts(DataType::Date));
        assert!(!ScaleType::Ratio.accepts(DataType::Date));
        assert!(!ScaleType::Ratio.accepts(DataType::String));
    }
}
