//! Keywords that combine whole sub-schemas.
//!
//! These are the only validators that look at the outcome of a sub-schema
//! instead of passing it on. A sub-schema's failure becomes the cause of
//! the combinator's own error, reported at the combinator's location.

use crate::compiler::{CompiledSchema, Compiler};
use crate::error::{DataErrorKind, DataValidationError, SchemaDefinitionError, ValidateError};
use crate::path::SchemaPath;
use crate::validate::Vm;
use serde_json::{Map, Value};

use super::invalid_value;

fn fail_with(vm: &Vm, kind: DataErrorKind, cause: DataValidationError) -> Result<(), ValidateError> {
    Err(vm.error(kind).with_cause(cause).into())
}

#[derive(Debug)]
pub(crate) struct AllOf {
    schemas: Vec<CompiledSchema>,
}

impl AllOf {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        Ok(Self {
            schemas: compiler.compile_schema_array(value, "allOf", path)?,
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        for (index, schema) in self.schemas.iter().enumerate() {
            if let Err(cause) = vm.attempt(schema, instance)? {
                return fail_with(vm, DataErrorKind::AllOf { index }, cause);
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct AnyOf {
    schemas: Vec<CompiledSchema>,
}

impl AnyOf {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        Ok(Self {
            schemas: compiler.compile_schema_array(value, "anyOf", path)?,
        })
    }

    /// Every branch is tried before giving up. The first branch's failure
    /// is kept as the cause.
    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let mut first_failure = None;

        for schema in &self.schemas {
            match vm.attempt(schema, instance)? {
                Ok(()) => return Ok(()),
                Err(cause) => {
                    first_failure.get_or_insert(cause);
                }
            }
        }

        match first_failure {
            Some(cause) => fail_with(vm, DataErrorKind::AnyOf, cause),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub(crate) struct OneOf {
    schemas: Vec<CompiledSchema>,
}

impl OneOf {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        Ok(Self {
            schemas: compiler.compile_schema_array(value, "oneOf", path)?,
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let mut passed = None;
        let mut first_failure = None;

        for (index, schema) in self.schemas.iter().enumerate() {
            match vm.attempt(schema, instance)? {
                Ok(()) => match passed {
                    Some(first) => {
                        return vm.fail(DataErrorKind::OneOfMany {
                            first,
                            second: index,
                        })
                    }
                    None => passed = Some(index),
                },
                Err(cause) => {
                    first_failure.get_or_insert(cause);
                }
            }
        }

        match (passed, first_failure) {
            (Some(_), _) => Ok(()),
            (None, Some(cause)) => fail_with(vm, DataErrorKind::OneOfNone, cause),
            (None, None) => vm.fail(DataErrorKind::OneOfNone),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Not {
    schema: Box<CompiledSchema>,
}

impl Not {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        Ok(Self {
            schema: Box::new(compiler.compile(value, path)?),
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        if vm.probe(&self.schema, instance)? {
            vm.fail(DataErrorKind::Not)
        } else {
            Ok(())
        }
    }
}

/// `if`, together with the `then` and `else` beside it.
#[derive(Debug)]
pub(crate) struct Conditional {
    condition: Box<CompiledSchema>,
    then: Option<Box<CompiledSchema>>,
    otherwise: Option<Box<CompiledSchema>>,
}

impl Conditional {
    pub fn compile(
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let mut branch = |keyword: &str| -> Result<Option<Box<CompiledSchema>>, SchemaDefinitionError> {
            match siblings.get(keyword) {
                Some(schema) => Ok(Some(Box::new(
                    compiler.compile(schema, &path.sibling(keyword))?,
                ))),
                None => Ok(None),
            }
        };

        let then = branch("then")?;
        let otherwise = branch("else")?;

        Ok(Self {
            condition: Box::new(compiler.compile(value, path)?),
            then,
            otherwise,
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let (branch, kind) = if vm.probe(&self.condition, instance)? {
            (&self.then, DataErrorKind::Then)
        } else {
            (&self.otherwise, DataErrorKind::Else)
        };

        if let Some(schema) = branch {
            if let Err(cause) = vm.attempt(schema, instance)? {
                return fail_with(vm, kind, cause);
            }
        }

        Ok(())
    }
}

/// Draft 3 `extends`: one schema or an array of schemas, all of which must
/// match.
#[derive(Debug)]
pub(crate) struct Extends {
    schemas: Vec<CompiledSchema>,
}

impl Extends {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let schemas = match value {
            Value::Object(_) => vec![compiler.compile(value, path)?],
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| compiler.compile(item, &path.index(i)))
                .collect::<Result<_, _>>()?,
            _ => return Err(invalid_value(path, "extends", "a schema or an array of schemas")),
        };

        Ok(Self { schemas })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        for (index, schema) in self.schemas.iter().enumerate() {
            if let Err(cause) = vm.attempt(schema, instance)? {
                return fail_with(vm, DataErrorKind::Extends { index }, cause);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::draft::Draft;
    use crate::error::DataErrorKind;
    use crate::keywords::testing::{data_error, is_valid};
    use serde_json::json;

    #[test]
    fn all_of_reports_the_failing_index() {
        let schema = json!({"allOf": [{"type": "integer"}, {"minimum": 3}]});
        assert!(is_valid(Draft::V4, schema.clone(), json!(4)));

        let err = data_error(Draft::V4, schema, json!(2)).unwrap();
        assert_eq!(DataErrorKind::AllOf { index: 1 }, err.kind);
        assert_eq!(
            "minimum is 3 but value was 2",
            err.cause.unwrap().kind.to_string()
        );
    }

    #[test]
    fn any_of() {
        let schema = json!({"anyOf": [{"type": "string"}, {"minimum": 3}]});
        assert!(is_valid(Draft::V4, schema.clone(), json!("a")));
        assert!(is_valid(Draft::V4, schema.clone(), json!(5)));
        assert!(!is_valid(Draft::V4, schema, json!(1)));
    }

    #[test]
    fn one_of_counts_matches() {
        let schema = json!({"oneOf": [{"type": "integer"}, {"minimum": 3}]});
        assert!(is_valid(Draft::V4, schema.clone(), json!(1)));
        assert!(is_valid(Draft::V4, schema.clone(), json!(3.5)));

        let err = data_error(Draft::V4, schema.clone(), json!(4)).unwrap();
        assert_eq!(DataErrorKind::OneOfMany { first: 0, second: 1 }, err.kind);

        let err = data_error(Draft::V4, schema, json!(1.5)).unwrap();
        assert_eq!(DataErrorKind::OneOfNone, err.kind);
        assert!(err.cause.is_some());
    }

    #[test]
    fn not() {
        assert!(is_valid(Draft::V4, json!({"not": {"type": "string"}}), json!(1)));
        assert!(!is_valid(Draft::V4, json!({"not": {"type": "string"}}), json!("a")));
        assert!(!is_valid(Draft::V7, json!({"not": true}), json!(null)));
    }

    #[test]
    fn conditionals() {
        let schema = json!({
            "if": {"type": "integer"},
            "then": {"minimum": 0},
            "else": {"type": "string"},
        });
        assert!(is_valid(Draft::V7, schema.clone(), json!(1)));
        assert!(is_valid(Draft::V7, schema.clone(), json!("a")));
        assert_eq!(
            DataErrorKind::Then,
            data_error(Draft::V7, schema.clone(), json!(-1)).unwrap().kind
        );
        assert_eq!(
            DataErrorKind::Else,
            data_error(Draft::V7, schema, json!(null)).unwrap().kind
        );

        // A missing branch accepts.
        assert!(is_valid(Draft::V7, json!({"if": {"type": "integer"}}), json!("a")));
        assert!(is_valid(
            Draft::V7,
            json!({"if": false, "then": false}),
            json!(1)
        ));
    }

    #[test]
    fn extends() {
        let schema = json!({"extends": [{"type": "integer"}, {"maximum": 3}]});
        assert!(is_valid(Draft::V3, schema.clone(), json!(2)));

        let err = data_error(Draft::V3, schema, json!(4)).unwrap();
        assert_eq!(DataErrorKind::Extends { index: 1 }, err.kind);
        assert!(!is_valid(Draft::V3, json!({"extends": {"type": "string"}}), json!(2)));
    }
}
