use crate::compiler::{CompiledSchema, Compiler};
use crate::draft::Draft;
use crate::error::{DataErrorKind, SchemaDefinitionError, SchemaErrorKind, ValidateError};
use crate::json;
use crate::path::SchemaPath;
use crate::validate::Vm;
use serde_json::Value;
use std::str::FromStr;

use super::invalid_value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TypeName {
    Any,
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl FromStr for TypeName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "null" => Ok(Self::Null),
            "boolean" => Ok(Self::Boolean),
            "integer" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            _ => Err(()),
        }
    }
}

impl TypeName {
    fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    fn matches(self, instance: &Value, relaxed_integers: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Null => instance.is_null(),
            Self::Boolean => instance.is_boolean(),
            Self::Integer => json::is_integer(instance, relaxed_integers),
            Self::Number => instance.is_number(),
            Self::String => instance.is_string(),
            Self::Array => instance.is_array(),
            Self::Object => instance.is_object(),
        }
    }
}

/// One alternative of a `type` (or `disallow`) list. Draft 3 allows a
/// schema where a type name would go.
#[derive(Debug)]
enum TypeMatcher {
    Name(TypeName),
    Schema(CompiledSchema),
}

/// `type`, and its draft 3 inverse `disallow`.
#[derive(Debug)]
pub(crate) struct Type {
    matchers: Vec<TypeMatcher>,
    relaxed_integers: bool,
}

impl Type {
    pub fn compile(
        value: &Value,
        keyword: &'static str,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let draft = compiler.draft();

        let matchers = match value {
            Value::String(name) => vec![TypeMatcher::Name(type_name(name, path)?)],
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(SchemaDefinitionError::new(
                        path.clone(),
                        SchemaErrorKind::EmptyKeywordValue { keyword },
                    ));
                }

                let mut matchers = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = path.index(i);
                    matchers.push(match item {
                        Value::String(name) => TypeMatcher::Name(type_name(name, &item_path)?),
                        Value::Object(_) if draft == Draft::V3 => {
                            TypeMatcher::Schema(compiler.compile(item, &item_path)?)
                        }
                        _ => return Err(invalid_value(&item_path, keyword, expected(draft))),
                    });
                }
                matchers
            }
            Value::Object(_) if draft == Draft::V3 => {
                vec![TypeMatcher::Schema(compiler.compile(value, path)?)]
            }
            _ => return Err(invalid_value(path, keyword, expected(draft))),
        };

        Ok(Self {
            matchers,
            relaxed_integers: draft.relaxes_integers(),
        })
    }

    fn matches(&self, vm: &mut Vm, instance: &Value) -> Result<bool, ValidateError> {
        for matcher in &self.matchers {
            let matched = match matcher {
                TypeMatcher::Name(name) => name.matches(instance, self.relaxed_integers),
                TypeMatcher::Schema(schema) => vm.probe(schema, instance)?,
            };

            if matched {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        if self.matches(vm, instance)? {
            return Ok(());
        }

        let expected = self
            .matchers
            .iter()
            .map(|matcher| match matcher {
                TypeMatcher::Name(name) => name.as_str().to_owned(),
                TypeMatcher::Schema(schema) => format!("schema {}", schema.location()),
            })
            .collect();

        vm.fail(DataErrorKind::Type {
            expected,
            found: json::type_name(instance),
        })
    }

    pub fn validate_disallow(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        if self.matches(vm, instance)? {
            vm.fail(DataErrorKind::Disallowed {
                found: json::type_name(instance),
            })
        } else {
            Ok(())
        }
    }
}

fn type_name(name: &str, path: &SchemaPath) -> Result<TypeName, SchemaDefinitionError> {
    name.parse().map_err(|_| {
        SchemaDefinitionError::new(path.clone(), SchemaErrorKind::UnknownType(name.to_owned()))
    })
}

fn expected(draft: Draft) -> &'static str {
    if draft == Draft::V3 {
        "a type name, a schema, or an array of them"
    } else {
        "a type name or an array of type names"
    }
}

#[derive(Debug)]
pub(crate) struct Enum {
    values: Vec<Value>,
}

impl Enum {
    pub fn compile(value: &Value, path: &SchemaPath) -> Result<Self, SchemaDefinitionError> {
        let values = value
            .as_array()
            .ok_or_else(|| invalid_value(path, "enum", "an array"))?;

        if values.is_empty() {
            return Err(SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::EmptyKeywordValue { keyword: "enum" },
            ));
        }

        Ok(Self {
            values: values.clone(),
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        if self.values.iter().any(|value| json::equal(value, instance)) {
            Ok(())
        } else {
            vm.fail(DataErrorKind::Enum)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_from_str() {
        assert_eq!(Err(()), "Integer".parse::<TypeName>());
        assert_eq!(Ok(TypeName::Any), "any".parse());
        assert_eq!(Ok(TypeName::Null), "null".parse());
        assert_eq!(Ok(TypeName::Boolean), "boolean".parse());
        assert_eq!(Ok(TypeName::Integer), "integer".parse());
        assert_eq!(Ok(TypeName::Number), "number".parse());
        assert_eq!(Ok(TypeName::String), "string".parse());
        assert_eq!(Ok(TypeName::Array), "array".parse());
        assert_eq!(Ok(TypeName::Object), "object".parse());
    }

    #[test]
    fn type_name_matches() {
        use serde_json::json;

        assert!(TypeName::Number.matches(&json!(1), false));
        assert!(TypeName::Number.matches(&json!(1.5), false));
        assert!(TypeName::Integer.matches(&json!(1), false));
        assert!(!TypeName::Integer.matches(&json!(1.0), false));
        assert!(TypeName::Integer.matches(&json!(1.0), true));
        assert!(!TypeName::Integer.matches(&json!(1.5), true));
        assert!(TypeName::Any.matches(&json!(null), false));
        assert!(!TypeName::Null.matches(&json!(false), false));
    }
}
