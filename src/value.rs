use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data_type::DataType;

/// Date format used for reading and writing [`Value::Date`] cells.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A typed cell value.
///
/// Values carry a total order so they can live in ordered discrete-value sets
/// and be compared against scale bounds. Numbers of different representation
/// compare numerically; otherwise values of different types order by their
/// conversion priority.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl Value {
    /// The data type this value was converted to.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::String(_) => DataType::String,
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Boolean(_) => DataType::Boolean,
            Value::Date(_) => DataType::Date,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widen the value to `target`.
    ///
    /// Integers widen to reals and anything widens to its displayed form.
    /// Returns the value unchanged when no widening applies.
    pub fn widen(self, target: DataType) -> Value {
        match (self, target) {
            (Value::Integer(i), DataType::Real) => Value::Real(i as f64),
            (Value::String(s), DataType::String) => Value::String(s),
            (other, DataType::String) => Value::String(other.to_string()),
            (other, _) => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Integer(a), Value::Real(b)) => cmp_integer_real(*a, *b).then(Ordering::Less),
            (Value::Real(a), Value::Integer(b)) => cmp_integer_real(*b, *a)
                .reverse()
                .then(Ordering::Greater),
            (a, b) => a.data_type().priority().cmp(&b.data_type().priority()),
        }
    }
}

/// Exact comparison of an integer with a real, without rounding the integer.
///
/// NaNs order like `f64::total_cmp`: positive NaN above every integer,
/// negative NaN below.
fn cmp_integer_real(i: i64, r: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if r.is_nan() {
        return if r.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if r >= TWO_POW_63 {
        return Ordering::Less;
    }
    if r < -TWO_POW_63 {
        return Ordering::Greater;
    }
    // |r| < 2^63 here, so its integral part fits an i64 exactly
    let whole = r.trunc();
    i.cmp(&(whole as i64)).then_with(|| {
        if r > whole {
            Ordering::Less
        } else if r < whole {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        assert!(Value::Integer(1) < Value::Integer(2));
        assert!(Value::Real(-3.0) < Value::Real(5.0));
        assert!(Value::Integer(1) < Value::Real(1.5));
        assert!(Value::Real(0.5) < Value::Integer(1));
        // same magnitude, different representation: ordered but not equal
        assert!(Value::Integer(1) < Value::Real(1.0));
        assert_ne!(Value::Integer(1), Value::Real(1.0));
    }

    #[test]
    fn test_numeric_ordering_beyond_f64_precision() {
        let big = 1i64 << 53;
        assert!(Value::Integer(big + 1) > Value::Real(big as f64));
        assert!(Value::Real(big as f64) < Value::Integer(big + 1));
        assert!(Value::Integer(i64::MAX) < Value::Real(9.3e18));
        assert!(Value::Integer(i64::MIN) > Value::Real(f64::NEG_INFINITY));
        assert!(Value::Integer(-3) < Value::Real(-2.5));
        assert!(Value::Integer(-2) > Value::Real(-2.5));
        assert!(Value::Integer(0) < Value::Real(f64::NAN));
    }

    #[test]
    fn test_cross_type_ordering_is_total() {
        let mut values = vec![
            Value::from("b"),
            Value::Boolean(true),
            Value::Integer(3),
            Value::from("a"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Integer(3),
                Value::Boolean(true),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Real(5.0).to_string(), "5");
        assert_eq!(Value::Real(-3.25).to_string(), "-3.25");
        assert_eq!(Value::Boolean(false).to_string(), "false");
        let date = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2023-01-15");
    }

    #[test]
    fn test_widen() {
        assert_eq!(Value::Integer(2).widen(DataType::Real), Value::Real(2.0));
        assert_eq!(
            Value::Boolean(true).widen(DataType::String),
            Value::from("true")
        );
        assert_eq!(Value::Real(1.5).widen(DataType::Real), Value::Real(1.5));
    }
}
