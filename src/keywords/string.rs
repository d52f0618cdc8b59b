use crate::compiler::Compiler;
use crate::error::{DataErrorKind, SchemaDefinitionError, ValidateError};
use crate::path::SchemaPath;
use crate::validate::Vm;
use regex::Regex;
use serde_json::Value;

use super::invalid_value;

// Lengths count characters, not bytes.

pub(crate) fn validate_min_length(
    limit: usize,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    if let Value::String(s) = instance {
        let length = s.chars().count();
        if length < limit {
            return vm.fail(DataErrorKind::MinLength { limit, length });
        }
    }

    Ok(())
}

pub(crate) fn validate_max_length(
    limit: usize,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    if let Value::String(s) = instance {
        let length = s.chars().count();
        if length > limit {
            return vm.fail(DataErrorKind::MaxLength { limit, length });
        }
    }

    Ok(())
}

/// `pattern`. The expression is unanchored, so it may match anywhere in
/// the string.
#[derive(Debug)]
pub(crate) struct Pattern {
    regex: Regex,
}

impl Pattern {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let source = value
            .as_str()
            .ok_or_else(|| invalid_value(path, "pattern", "a string"))?;

        Ok(Self {
            regex: compiler.regex(source, path)?,
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        match instance {
            Value::String(s) if !self.regex.is_match(s) => vm.fail(DataErrorKind::Pattern {
                pattern: self.regex.as_str().to_owned(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::keywords::testing::data_error;
    use crate::draft::Draft;
    use crate::error::DataErrorKind;
    use serde_json::{json, Value};

    fn kind(schema: Value, instance: Value) -> Option<DataErrorKind> {
        data_error(Draft::V7, schema, instance).map(|err| err.kind)
    }

    #[test]
    fn lengths_count_characters() {
        assert_eq!(None, kind(json!({"maxLength": 2}), json!("日本")));
        assert_eq!(
            Some(DataErrorKind::MinLength { limit: 3, length: 2 }),
            kind(json!({"minLength": 3}), json!("日本"))
        );
        assert_eq!(None, kind(json!({"minLength": 3}), json!(12)));
    }

    #[test]
    fn patterns_are_unanchored() {
        assert_eq!(None, kind(json!({"pattern": "b+"}), json!("abbbc")));
        assert_eq!(
            Some(DataErrorKind::Pattern {
                pattern: "^b".to_owned()
            }),
            kind(json!({"pattern": "^b"}), json!("abc"))
        );
        assert_eq!(None, kind(json!({"pattern": "^b"}), json!(["abc"])));
    }
}
