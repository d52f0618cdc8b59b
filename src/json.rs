//! The JSON value model the engine validates against.
//!
//! Values are plain [`serde_json::Value`]s (built with `preserve_order`, so
//! objects keep their insertion order). This module adds the pieces JSON
//! Schema needs on top of `serde_json`: decoding of byte input in any of
//! the encodings RFC 4627 allows, rejection of duplicate object keys, and
//! structural equality where `3` and `3.0` are the same number.

use serde::de::{self, DeserializeSeed, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// The character encoding of a JSON byte source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Encoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl Encoding {
    /// Guesses the encoding of `bytes` from a byte order mark, or from the
    /// pattern of zero bytes among the first four bytes of the text.
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0x00, 0x00, 0xFE, 0xFF, ..] => Encoding::Utf32Be,
            [0xFF, 0xFE, 0x00, 0x00, ..] => Encoding::Utf32Le,
            [0xFE, 0xFF, ..] => Encoding::Utf16Be,
            [0xFF, 0xFE, ..] => Encoding::Utf16Le,
            [0xEF, 0xBB, 0xBF, ..] => Encoding::Utf8,
            [0x00, 0x00, 0x00, _, ..] => Encoding::Utf32Be,
            [_, 0x00, 0x00, 0x00, ..] => Encoding::Utf32Le,
            [0x00, _, 0x00, _, ..] | [0x00, _] => Encoding::Utf16Be,
            [_, 0x00, _, 0x00, ..] | [_, 0x00] => Encoding::Utf16Le,
            _ => Encoding::Utf8,
        }
    }

    fn bom(self) -> &'static [u8] {
        match self {
            Encoding::Utf8 => &[0xEF, 0xBB, 0xBF],
            Encoding::Utf16Le => &[0xFF, 0xFE],
            Encoding::Utf16Be => &[0xFE, 0xFF],
            Encoding::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Encoding::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum JsonError {
    #[error("input is not valid {encoding:?} text")]
    Decode { encoding: Encoding },

    #[error("malformed JSON at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

impl From<serde_json::Error> for JsonError {
    fn from(err: serde_json::Error) -> Self {
        JsonError::Syntax {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}

/// Decodes `bytes` into text. A byte order mark matching the encoding is
/// stripped.
pub fn decode(bytes: &[u8], encoding: Option<Encoding>) -> Result<String, JsonError> {
    let encoding = encoding.unwrap_or_else(|| Encoding::sniff(bytes));
    let bytes = bytes.strip_prefix(encoding.bom()).unwrap_or(bytes);
    let invalid = || JsonError::Decode { encoding };

    match encoding {
        Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| invalid()),
        Encoding::Utf16Le | Encoding::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err(invalid());
            }

            let units = bytes.chunks_exact(2).map(|pair| {
                if encoding == Encoding::Utf16Le {
                    u16::from_le_bytes([pair[0], pair[1]])
                } else {
                    u16::from_be_bytes([pair[0], pair[1]])
                }
            });

            std::char::decode_utf16(units)
                .collect::<Result<String, _>>()
                .map_err(|_| invalid())
        }
        Encoding::Utf32Le | Encoding::Utf32Be => {
            if bytes.len() % 4 != 0 {
                return Err(invalid());
            }

            bytes
                .chunks_exact(4)
                .map(|quad| {
                    let quad = [quad[0], quad[1], quad[2], quad[3]];
                    let code = if encoding == Encoding::Utf32Le {
                        u32::from_le_bytes(quad)
                    } else {
                        u32::from_be_bytes(quad)
                    };
                    std::char::from_u32(code).ok_or_else(invalid)
                })
                .collect()
        }
    }
}

/// Parses JSON text, rejecting objects that repeat a key.
pub fn parse_str(text: &str) -> Result<Value, JsonError> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    let value = StrictValue.deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

/// Decodes and parses a JSON byte source.
pub fn parse(bytes: &[u8], encoding: Option<Encoding>) -> Result<Value, JsonError> {
    parse_str(&decode(bytes, encoding)?)
}

struct StrictValue;

impl<'de> DeserializeSeed<'de> for StrictValue {
    type Value = Value;

    fn deserialize<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for StrictValue {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| E::custom("number is not finite"))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut out = Vec::new();
        while let Some(element) = seq.next_element_seed(StrictValue)? {
            out.push(element);
        }

        Ok(Value::Array(out))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut out = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if out.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key `{}`", key)));
            }

            let value = map.next_value_seed(StrictValue)?;
            out.insert(key, value);
        }

        Ok(Value::Object(out))
    }
}

/// The JSON Schema type name of a value. Whole numbers stored as integers
/// report `"integer"`; everything else numeric reports `"number"`.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether `value` counts as an integer. With `relaxed`, a float with no
/// fractional part (such as `3.0`) counts too.
pub fn is_integer(value: &Value, relaxed: bool) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => relaxed && n.as_f64().map_or(false, |f| f.fract() == 0.0),
        _ => false,
    }
}

/// Orders two numbers by value, exactly when both are integers.
pub fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }

    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }

    let a = a.as_f64().unwrap_or(f64::NAN);
    let b = b.as_f64().unwrap_or(f64::NAN);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Deep structural equality in which numbers compare by value.
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Ordering::Equal,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, a)| b.get(key).map_or(false, |b| equal(a, b)))
        }
        (a, b) => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sniff_encodings() {
        assert_eq!(Encoding::Utf8, Encoding::sniff(b"{}"));
        assert_eq!(Encoding::Utf8, Encoding::sniff(b"\xEF\xBB\xBF{}"));
        assert_eq!(Encoding::Utf16Be, Encoding::sniff(b"\x00{\x00}"));
        assert_eq!(Encoding::Utf16Le, Encoding::sniff(b"{\x00}\x00"));
        assert_eq!(Encoding::Utf32Be, Encoding::sniff(b"\x00\x00\x00{"));
        assert_eq!(Encoding::Utf32Le, Encoding::sniff(b"{\x00\x00\x00"));
        assert_eq!(Encoding::Utf16Le, Encoding::sniff(b"\xFF\xFE{\x00"));
    }

    #[test]
    fn parse_utf16() {
        let text: Vec<u8> = "[1, \"\u{e9}\"]"
            .encode_utf16()
            .flat_map(|unit| unit.to_be_bytes().to_vec())
            .collect();

        assert_eq!(json!([1, "\u{e9}"]), parse(&text, None).unwrap());
        assert_eq!(
            json!([1, "\u{e9}"]),
            parse(&text, Some(Encoding::Utf16Be)).unwrap()
        );
    }

    #[test]
    fn parse_utf8_with_bom() {
        assert_eq!(json!({"a": 1}), parse(b"\xEF\xBB\xBF{\"a\": 1}", None).unwrap());
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            Err(JsonError::Decode {
                encoding: Encoding::Utf8
            }),
            parse(b"\"\xC3\x28\"", Some(Encoding::Utf8))
        );
        assert!(matches!(
            parse(b"{\"a\": 1,}", None),
            Err(JsonError::Syntax { .. })
        ));
        assert!(matches!(parse(b"[1] 2", None), Err(JsonError::Syntax { .. })));
    }

    #[test]
    fn parse_rejects_duplicate_keys() {
        match parse_str(r#"{"a": 1, "b": {"c": 1, "c": 2}}"#) {
            Err(JsonError::Syntax { message, .. }) => assert!(message.contains("duplicate key `c`")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn parse_preserves_key_order() {
        let value = parse_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(vec!["z", "a", "m"], keys);
    }

    #[test]
    fn type_names() {
        assert_eq!("null", type_name(&json!(null)));
        assert_eq!("boolean", type_name(&json!(true)));
        assert_eq!("integer", type_name(&json!(3)));
        assert_eq!("number", type_name(&json!(3.0)));
        assert_eq!("string", type_name(&json!("")));
        assert_eq!("array", type_name(&json!([])));
        assert_eq!("object", type_name(&json!({})));
    }

    #[test]
    fn integers() {
        assert!(is_integer(&json!(3), false));
        assert!(!is_integer(&json!(3.0), false));
        assert!(is_integer(&json!(3.0), true));
        assert!(!is_integer(&json!(3.1), true));
        assert!(!is_integer(&json!("3"), true));
    }

    #[test]
    fn equality() {
        assert!(equal(&json!(3), &json!(3.0)));
        assert!(!equal(&json!(3), &json!(3.1)));
        assert!(equal(&json!({"a": 1, "b": [1.0]}), &json!({"b": [1], "a": 1})));
        assert!(!equal(&json!([1, 2]), &json!([2, 1])));
        assert!(!equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!equal(&json!(1), &json!("1")));
        assert!(!equal(&json!(null), &json!(false)));
    }

    #[test]
    fn number_ordering() {
        let n = |v: Value| match v {
            Value::Number(n) => n,
            other => panic!("not a number: {}", other),
        };
        assert_eq!(Ordering::Less, compare_numbers(&n(json!(1)), &n(json!(1.5))));
        assert_eq!(Ordering::Greater, compare_numbers(&n(json!(u64::MAX)), &n(json!(-1))));
        assert_eq!(Ordering::Equal, compare_numbers(&n(json!(2.0)), &n(json!(2))));
    }
}
