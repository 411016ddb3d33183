//! Navigation over untyped, tag-indexed records.
//!
//! Records are JSON objects keyed by decimal tag strings (`"1"`, `"17"`, ...)
//! nested arbitrarily deep. A JSON `null` is treated the same as an absent
//! field, and integers may be rendered either as numbers or decimal strings
//! (64-bit values often are).

use base64::prelude::*;
use exn::{OptionExt, ResultExt};
use serde_json::Value;

use crate::error::{ErrorKind, Result};

/// Follows a path of tags through nested records.
pub(crate) fn at<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(record, |value, tag| value.as_object()?.get(*tag))
        .filter(|value| !value.is_null())
}

/// Returns `true` if a value is present at the given path.
pub(crate) fn has(record: &Value, path: &[&str]) -> bool {
    at(record, path).is_some()
}

/// Like [`at`], but only yields non-empty records.
///
/// Optional sub-records are treated as present only when they carry at least
/// one field.
pub(crate) fn block<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    at(record, path).filter(|value| value.as_object().is_some_and(|fields| !fields.is_empty()))
}

/// Like [`at`], but a missing field is an error.
pub(crate) fn required<'a>(record: &'a Value, path: &[&str], field: &'static str) -> Result<&'a Value> {
    at(record, path).ok_or_raise(|| ErrorKind::MissingField(field))
}

/// Normalizes a repeated field.
///
/// The encoding collapses a list of one into the bare element, and omits empty
/// lists entirely: both are read back here as slices.
pub(crate) fn repeated(value: Option<&Value>) -> &[Value] {
    match value {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items.as_slice(),
        Some(value) => std::slice::from_ref(value),
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Reads the raw bit pattern of a 64-bit scalar, signed or unsigned.
pub(crate) fn bits64(value: &Value, field: &'static str) -> Result<u64> {
    let bits = match value {
        // Two's complement reinterpretation is the point here.
        Value::Number(number) => number.as_u64().or_else(|| number.as_i64().map(|n| n as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok().or_else(|| s.trim().parse::<i64>().ok().map(|n| n as u64)),
        _ => None,
    };
    bits.ok_or_raise(|| ErrorKind::ParseError { field, value: value.to_string() })
}

/// Reads an integer scalar, converting it into the target width.
pub(crate) fn int<T: TryFrom<i64>>(value: &Value, field: &'static str) -> Result<T> {
    integer(value)
        .and_then(|n| T::try_from(n).ok())
        .ok_or_raise(|| ErrorKind::ParseError { field, value: value.to_string() })
}

pub(crate) fn req_int<T: TryFrom<i64>>(record: &Value, path: &[&str], field: &'static str) -> Result<T> {
    int(required(record, path, field)?, field)
}

pub(crate) fn opt_int<T: TryFrom<i64>>(record: &Value, path: &[&str], field: &'static str) -> Result<Option<T>> {
    at(record, path).map(|value| int(value, field)).transpose()
}

/// Reads a text scalar.
pub(crate) fn text(value: &Value, field: &'static str) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_raise(|| ErrorKind::ParseError { field, value: value.to_string() })
}

/// Reads a scalar that is sometimes rendered as text and sometimes as an integer.
pub(crate) fn identifier(value: &Value, field: &'static str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(number) => Ok(number.to_string()),
        _ => exn::bail!(ErrorKind::ParseError { field, value: value.to_string() }),
    }
}

pub(crate) fn req_text(record: &Value, path: &[&str], field: &'static str) -> Result<String> {
    text(required(record, path, field)?, field)
}

pub(crate) fn opt_text(record: &Value, path: &[&str], field: &'static str) -> Result<Option<String>> {
    at(record, path).map(|value| text(value, field)).transpose()
}

/// Reads a required enum-like integer and compares it against the "set" value.
pub(crate) fn flag(record: &Value, path: &[&str], set: i64, field: &'static str) -> Result<bool> {
    Ok(req_int::<i64>(record, path, field)? == set)
}

/// Reads a byte field.
///
/// Bytes are rendered either as a list of octets or as standard base64 text.
pub(crate) fn bytes(value: &Value, field: &'static str) -> Result<Vec<u8>> {
    match value {
        Value::Array(octets) => octets
            .iter()
            .map(|octet| int::<u8>(octet, field))
            .collect::<Result<Vec<u8>>>(),
        Value::String(encoded) => BASE64_STANDARD_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .or_raise(|| ErrorKind::ParseError { field, value: encoded.clone() }),
        _ => exn::bail!(ErrorKind::ParseError { field, value: value.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_at_follows_nested_tags() {
        let record = json!({"2": {"35": {"2": 1024}}});
        assert_eq!(at(&record, &["2", "35", "2"]), Some(&json!(1024)));
        assert_eq!(at(&record, &["2", "36"]), None);
        assert_eq!(at(&record, &["2", "35", "2", "1"]), None);
    }

    #[test]
    fn test_block_skips_empty_records() {
        let record = json!({"17": {"1": {}, "5": {"3": "id"}}});
        assert!(block(&record, &["17", "1"]).is_none());
        assert!(block(&record, &["17", "5"]).is_some());
        assert!(block(&record, &["17", "5", "3"]).is_none());
    }

    #[test]
    fn test_null_is_absent() {
        let record = json!({"3": null});
        assert!(!has(&record, &["3"]));
        assert_eq!(opt_text(&record, &["3"], "caption").unwrap(), None);
    }

    #[rstest]
    #[case(json!({"1": "a"}), 1)]
    #[case(json!([{"1": "a"}, {"1": "b"}]), 2)]
    #[case(json!([]), 0)]
    #[case(json!(null), 0)]
    fn test_repeated_normalizes_bare_records(#[case] value: Value, #[case] expected: usize) {
        assert_eq!(repeated(Some(&value)).len(), expected);
    }

    #[test]
    fn test_repeated_absent_is_empty() {
        assert!(repeated(None).is_empty());
    }

    #[rstest]
    #[case(json!(42), 42)]
    #[case(json!("42"), 42)]
    #[case(json!("-7"), -7)]
    fn test_int_accepts_numbers_and_strings(#[case] value: Value, #[case] expected: i64) {
        assert_eq!(int::<i64>(&value, "n").unwrap(), expected);
    }

    #[test]
    fn test_int_rejects_out_of_range() {
        let err = int::<u8>(&json!(300), "octet").unwrap_err();
        assert!(matches!(*err, ErrorKind::ParseError { field: "octet", .. }));
    }

    #[test]
    fn test_missing_required_field_names_the_field() {
        let err = req_text(&json!({}), &["2", "4"], "file_name").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingField("file_name"));
    }

    #[test]
    fn test_bytes_from_octets_and_base64() {
        assert_eq!(bytes(&json!([1, 2, 255]), "b").unwrap(), vec![1, 2, 255]);
        assert_eq!(bytes(&json!("AQL/"), "b").unwrap(), vec![1, 2, 255]);
        assert_eq!(bytes(&json!("AQI="), "b").unwrap(), vec![1, 2]);
        assert_eq!(bytes(&json!("AQI"), "b").unwrap(), vec![1, 2]);
        assert!(bytes(&json!("not base64!"), "b").is_err());
        assert!(bytes(&json!({"1": 1}), "b").is_err());
    }

    #[test]
    fn test_bits64_reinterprets_negative_numbers() {
        assert_eq!(bits64(&json!(-1), "bits").unwrap(), u64::MAX);
        assert_eq!(bits64(&json!(u64::MAX), "bits").unwrap(), u64::MAX);
    }
}
