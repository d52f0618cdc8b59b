use crate::error::{DataErrorKind, SchemaDefinitionError, SchemaErrorKind, ValidateError};
use crate::json;
use crate::path::SchemaPath;
use crate::validate::Vm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use super::invalid_value;

/// Transfer encodings that leave the string as it is.
const IDENTITY_ENCODINGS: &[&str] = &["7bit", "8bit", "binary", "quoted-printable"];

/// `contentEncoding: base64`. The identity encodings compile to nothing.
#[derive(Debug)]
pub(crate) struct ContentEncoding;

impl ContentEncoding {
    pub fn compile(value: &Value, path: &SchemaPath) -> Result<Option<Self>, SchemaDefinitionError> {
        match encoding(value, path)? {
            Encoding::Base64 => Ok(Some(Self)),
            Encoding::Identity => Ok(None),
        }
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        match instance {
            Value::String(s) if STANDARD.decode(s).is_err() => {
                vm.fail(DataErrorKind::ContentEncoding {
                    encoding: "base64".to_owned(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// `contentMediaType: application/json`. The string, decoded first if a
/// `contentEncoding` sits beside it, must hold a JSON document. Other media
/// types are not checked.
#[derive(Debug)]
pub(crate) struct ContentMediaType {
    base64: bool,
}

impl ContentMediaType {
    pub fn compile(
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
    ) -> Result<Option<Self>, SchemaDefinitionError> {
        let media_type = value
            .as_str()
            .ok_or_else(|| invalid_value(path, "contentMediaType", "a string"))?;

        if !media_type.eq_ignore_ascii_case("application/json") {
            return Ok(None);
        }

        // The sibling is checked again when it is compiled; a bad one
        // fails there with its own path.
        let base64 = match siblings.get("contentEncoding") {
            Some(value) => matches!(
                encoding(value, &path.sibling("contentEncoding")),
                Ok(Encoding::Base64)
            ),
            None => false,
        };

        Ok(Some(Self { base64 }))
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let s = match instance {
            Value::String(s) => s,
            _ => return Ok(()),
        };

        let bytes = if self.base64 {
            match STANDARD.decode(s) {
                Ok(bytes) => bytes,
                // Reported by contentEncoding.
                Err(_) => return Ok(()),
            }
        } else {
            s.as_bytes().to_vec()
        };

        match json::parse(&bytes, None) {
            Ok(_) => Ok(()),
            Err(_) => vm.fail(DataErrorKind::ContentMediaType {
                media_type: "application/json".to_owned(),
            }),
        }
    }
}

enum Encoding {
    Identity,
    Base64,
}

fn encoding(value: &Value, path: &SchemaPath) -> Result<Encoding, SchemaDefinitionError> {
    let name = value
        .as_str()
        .ok_or_else(|| invalid_value(path, "contentEncoding", "a string"))?
        .to_ascii_lowercase();

    if name == "base64" {
        Ok(Encoding::Base64)
    } else if IDENTITY_ENCODINGS.contains(&name.as_str()) {
        Ok(Encoding::Identity)
    } else {
        Err(SchemaDefinitionError::new(
            path.clone(),
            SchemaErrorKind::UnknownContentEncoding(name),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::draft::Draft;
    use crate::keywords::testing::{data_error, is_valid};
    use serde_json::json;

    #[test]
    fn base64_strings() {
        let schema = json!({"contentEncoding": "base64"});
        assert!(is_valid(Draft::V7, schema.clone(), json!("eyJhIjogMX0=")));
        assert!(!is_valid(Draft::V7, schema.clone(), json!("not base64!")));
        assert!(is_valid(Draft::V7, schema, json!(17)));
        assert!(is_valid(Draft::V7, json!({"contentEncoding": "7bit"}), json!("é")));
    }

    #[test]
    fn json_documents() {
        let schema = json!({"contentMediaType": "application/json"});
        assert!(is_valid(Draft::V7, schema.clone(), json!("{\"a\": 1}")));
        assert!(!is_valid(Draft::V7, schema.clone(), json!("{\"a\": ")));
        assert!(!is_valid(Draft::V7, schema, json!("{\"a\": 1, \"a\": 2}")));

        // Other media types are annotations.
        assert!(is_valid(
            Draft::V7,
            json!({"contentMediaType": "text/html"}),
            json!("<p")
        ));
    }

    #[test]
    fn encoded_json_documents() {
        let schema = json!({
            "contentEncoding": "base64",
            "contentMediaType": "application/json",
        });

        // {"a": 1}
        assert!(is_valid(Draft::V7, schema.clone(), json!("eyJhIjogMX0=")));
        // {"a":
        let err = data_error(Draft::V7, schema.clone(), json!("eyJhIjo=")).unwrap();
        assert_eq!("content is not valid application/json", err.kind.to_string());
        // Undecodable strings fail on the encoding, not the media type.
        let err = data_error(Draft::V7, schema, json!("%%%")).unwrap();
        assert_eq!("string is not base64 encoded", err.kind.to_string());
    }
}
