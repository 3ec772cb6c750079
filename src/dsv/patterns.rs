//! Compiled lexical patterns used by cell conversion.

use std::sync::LazyLock;

use regex::Regex;

/// Decimal numbers with optional fraction and exponent.
pub static FLOAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:\d+\.?\d*|\d*\.?\d+)(?:[eE][-+]?\d+)?$").expect("Invalid float pattern")
});

/// Non-finite real literals accepted for real-typed cells.
pub static NON_FINITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:nan|[-+]?inf(?:inity)?)$").expect("Invalid non-finite pattern")
});

/// ISO 8601 dates (YYYY-MM-DD, also YYYY/MM/DD).
pub static DATE_ISO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid ISO date pattern")
});
