use crate::draft::Draft;
use crate::json::JsonError;
use crate::path::{DataPath, SchemaPath};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The schema document itself is malformed, uses a keyword its dialect
/// lacks, or has a `$ref` that cannot be resolved.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("invalid schema at {path}: {kind}")]
pub struct SchemaDefinitionError {
    pub path: SchemaPath,
    pub kind: SchemaErrorKind,
}

impl SchemaDefinitionError {
    pub fn new(path: SchemaPath, kind: SchemaErrorKind) -> Self {
        Self { path, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SchemaErrorKind {
    #[error("a schema must be {expected}")]
    InvalidSchema { expected: &'static str },

    #[error("`{keyword}` must be {expected}")]
    InvalidKeywordValue {
        keyword: &'static str,
        expected: &'static str,
    },

    #[error("`{keyword}` must not be empty")]
    EmptyKeywordValue { keyword: &'static str },

    #[error("`{keyword}` requires `{sibling}` beside it")]
    MissingSibling {
        keyword: &'static str,
        sibling: &'static str,
    },

    #[error("`{keyword}` is not available in {draft}")]
    UnsupportedKeyword { keyword: String, draft: Draft },

    #[error("unknown type name `{0}`")]
    UnknownType(String),

    #[error("unknown format `{0}`")]
    UnknownFormat(String),

    #[error("unknown content encoding `{0}`")]
    UnknownContentEncoding(String),

    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("unknown schema document `{0}`")]
    UnknownDocument(String),

    #[error("reference `{0}` does not point into its document")]
    UnresolvableReference(String),

    #[error("cyclic reference through `{0}`")]
    CyclicReference(String),

    #[error("schema document is not valid JSON: {0}")]
    Json(#[from] JsonError),
}

/// An instance failed a constraint of a well-formed schema.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("{path}: {kind}")]
pub struct DataValidationError {
    pub path: DataPath,
    pub kind: DataErrorKind,
    #[source]
    pub cause: Option<Box<DataValidationError>>,
}

impl DataValidationError {
    pub fn new(path: DataPath, kind: DataErrorKind) -> Self {
        Self {
            path,
            kind,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: DataValidationError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The innermost error in the cause chain.
    pub fn root_cause(&self) -> &DataValidationError {
        let mut current = self;
        while let Some(cause) = &current.cause {
            current = cause;
        }
        current
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DataErrorKind {
    FalseSchema,
    Type {
        expected: Vec<String>,
        found: &'static str,
    },
    Disallowed {
        found: &'static str,
    },
    Enum,
    Const {
        expected: Value,
    },
    Minimum {
        limit: Value,
        exclusive: bool,
        value: Value,
    },
    Maximum {
        limit: Value,
        exclusive: bool,
        value: Value,
    },
    MultipleOf {
        divisor: Value,
        value: Value,
    },
    MinLength {
        limit: usize,
        length: usize,
    },
    MaxLength {
        limit: usize,
        length: usize,
    },
    Pattern {
        pattern: String,
    },
    Format {
        format: String,
    },
    ContentEncoding {
        encoding: String,
    },
    ContentMediaType {
        media_type: String,
    },
    MinItems {
        limit: usize,
        count: usize,
    },
    MaxItems {
        limit: usize,
        count: usize,
    },
    UniqueItems {
        first: usize,
        second: usize,
    },
    AdditionalItems {
        limit: usize,
    },
    Contains,
    MinProperties {
        limit: usize,
        count: usize,
    },
    MaxProperties {
        limit: usize,
        count: usize,
    },
    Required {
        property: String,
    },
    AdditionalProperty {
        property: String,
    },
    PropertyName {
        name: String,
    },
    Dependency {
        trigger: String,
        missing: Option<String>,
    },
    AllOf {
        index: usize,
    },
    AnyOf,
    OneOfNone,
    OneOfMany {
        first: usize,
        second: usize,
    },
    Not,
    Then,
    Else,
    Extends {
        index: usize,
    },
}

impl fmt::Display for DataErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use DataErrorKind::*;

        match self {
            FalseSchema => write!(f, "no value is allowed here"),
            Type { expected, found } => {
                write!(f, "type is {} but value was {}", expected.join(" or "), found)
            }
            Disallowed { found } => write!(f, "type {} is disallowed", found),
            Enum => write!(f, "value is not one of the enumerated values"),
            Const { expected } => write!(f, "value must be {}", expected),
            Minimum {
                limit,
                exclusive,
                value,
            } => {
                let kind = if *exclusive { "exclusive minimum" } else { "minimum" };
                write!(f, "{} is {} but value was {}", kind, limit, value)
            }
            Maximum {
                limit,
                exclusive,
                value,
            } => {
                let kind = if *exclusive { "exclusive maximum" } else { "maximum" };
                write!(f, "{} is {} but value was {}", kind, limit, value)
            }
            MultipleOf { divisor, value } => {
                write!(f, "value {} is not a multiple of {}", value, divisor)
            }
            MinLength { limit, length } => {
                write!(f, "minLength is {} but length was {}", limit, length)
            }
            MaxLength { limit, length } => {
                write!(f, "maxLength is {} but length was {}", limit, length)
            }
            Pattern { pattern } => write!(f, "string does not match pattern `{}`", pattern),
            Format { format } => write!(f, "string is not a valid {}", format),
            ContentEncoding { encoding } => write!(f, "string is not {} encoded", encoding),
            ContentMediaType { media_type } => {
                write!(f, "content is not valid {}", media_type)
            }
            MinItems { limit, count } => {
                write!(f, "minItems is {} but array had {}", limit, count)
            }
            MaxItems { limit, count } => {
                write!(f, "maxItems is {} but array had {}", limit, count)
            }
            UniqueItems { first, second } => {
                write!(f, "items {} and {} are equal", first, second)
            }
            AdditionalItems { limit } => {
                write!(f, "no items are allowed past index {}", limit.saturating_sub(1))
            }
            Contains => write!(f, "no item matches the `contains` schema"),
            MinProperties { limit, count } => {
                write!(f, "minProperties is {} but object had {}", limit, count)
            }
            MaxProperties { limit, count } => {
                write!(f, "maxProperties is {} but object had {}", limit, count)
            }
            Required { property } => write!(f, "property `{}` is required", property),
            AdditionalProperty { property } => {
                write!(f, "property `{}` is not allowed", property)
            }
            PropertyName { name } => write!(f, "property name `{}` is invalid", name),
            Dependency {
                trigger,
                missing: Some(missing),
            } => write!(f, "property `{}` requires property `{}`", trigger, missing),
            Dependency {
                trigger,
                missing: None,
            } => write!(f, "property `{}` requires the object to match a schema", trigger),
            AllOf { index } => write!(f, "value does not match allOf schema {}", index),
            AnyOf => write!(f, "value does not match any anyOf schema"),
            OneOfNone => write!(f, "value does not match any oneOf schema"),
            OneOfMany { first, second } => write!(
                f,
                "value matches oneOf schemas {} and {}, but only one is allowed",
                first, second
            ),
            Not => write!(f, "value must not match the `not` schema"),
            Then => write!(f, "value matches `if` but not `then`"),
            Else => write!(f, "value does not match `if` nor `else`"),
            Extends { index } => write!(f, "value does not match extended schema {}", index),
        }
    }
}

/// Failure of a single validation run. Reference resolution happens while
/// validating, so a broken schema can still surface here.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Schema(#[from] SchemaDefinitionError),

    #[error(transparent)]
    Data(#[from] DataValidationError),
}

/// Any failure of the public entry points.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaDefinitionError),

    #[error(transparent)]
    Data(#[from] DataValidationError),

    #[error("instance is not valid JSON: {0}")]
    Json(#[from] JsonError),
}

impl From<ValidateError> for Error {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::Schema(err) => Error::Schema(err),
            ValidateError::Data(err) => Error::Data(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_carry_parameters() {
        let err = DataValidationError::new(
            "$.a".parse().unwrap(),
            DataErrorKind::Maximum {
                limit: json!(10),
                exclusive: false,
                value: json!(12),
            },
        );
        assert_eq!("$.a: maximum is 10 but value was 12", err.to_string());

        let err = SchemaDefinitionError::new(
            SchemaPath::root(None).property("enum"),
            SchemaErrorKind::EmptyKeywordValue { keyword: "enum" },
        );
        assert_eq!("invalid schema at $.enum: `enum` must not be empty", err.to_string());
    }

    #[test]
    fn cause_chain() {
        let inner = DataValidationError::new(DataPath::root(), DataErrorKind::Enum);
        let outer =
            DataValidationError::new(DataPath::root(), DataErrorKind::AllOf { index: 1 })
                .with_cause(inner.clone());

        assert_eq!(&inner, outer.root_cause());
        assert_eq!(
            Some(inner.to_string()),
            std::error::Error::source(&outer).map(|e| e.to_string())
        );
    }
}
