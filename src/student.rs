//! Student record model
//!
//! Documents come back from the store with whatever shape the upstream data
//! happens to have. [`StudentRecord::from_document`] is the single place that
//! turns them into a typed record, coercing or defaulting every field
//! instead of trusting the source.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One student's record, keyed by the student's uid.
///
/// # Examples
///
/// ```
/// use kampus::student::StudentRecord;
/// use serde_json::json;
///
/// let record = StudentRecord::from_document(&json!({
///     "nama": "Budi",
///     "nim": "123",
///     "jurusan": "TI",
///     "angkatan": "2023"
/// }));
/// assert_eq!(record.angkatan, Some(2023));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Full name
    pub nama: String,
    /// Student registration number
    pub nim: String,
    /// Major / department
    pub jurusan: String,
    /// Enrollment year
    pub angkatan: Option<i64>,
}

impl StudentRecord {
    /// Converts an untyped document into a record.
    ///
    /// Text fields accept strings, numbers, and booleans (stringified);
    /// anything else becomes an empty string. The enrollment year accepts an
    /// integer, a float (truncated), or text starting with an integer.
    pub fn from_document(document: &Value) -> Self {
        if !document.is_object() {
            tracing::warn!("Student document is not an object, using empty record");
        }
        Self {
            nama: text_field(document, "nama"),
            nim: text_field(document, "nim"),
            jurusan: text_field(document, "jurusan"),
            angkatan: normalize_year(document.get("angkatan")),
        }
    }
}

fn text_field(document: &Value, name: &str) -> String {
    match document.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Normalizes an enrollment year to an integer.
///
/// Text is read the way a lenient integer parser reads it: optional leading
/// whitespace and sign, then as many digits as follow. `"2023"` and
/// `"2023/2024"` both give 2023; text with no leading digits gives `None`.
pub fn normalize_year(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1, &trimmed[1..]),
        Some(b'+') => (1, &trimmed[1..]),
        _ => (1, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    rest[..digits_len].parse::<i64>().ok().map(|n| sign * n)
}
