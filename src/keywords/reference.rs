use crate::compiler::Compiler;
use crate::error::{SchemaDefinitionError, ValidateError};
use crate::path::SchemaPath;
use crate::validate::Vm;
use serde_json::Value;
use tracing::debug;

use super::invalid_value;

/// `$ref`. The target is resolved and compiled afresh on every validation,
/// since it may lead back into the schema that holds the reference.
#[derive(Debug)]
pub(crate) struct Reference {
    reference: String,
    location: SchemaPath,
}

impl Reference {
    /// Checks that the target resolves and compiles. Each target is only
    /// checked once per compiler, which keeps recursive schemas finite.
    pub fn compile(
        value: &Value,
        location: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let reference = value
            .as_str()
            .ok_or_else(|| invalid_value(location, "$ref", "a string"))?;

        let resolved = compiler.resolver().resolve(reference, location)?;
        if compiler.should_check_reference(&resolved.key) {
            compiler.compile(resolved.fragment, &resolved.location)?;
        }

        Ok(Self {
            reference: reference.to_owned(),
            location: location.clone(),
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let resolver = vm.resolver();
        let resolved = resolver.resolve(&self.reference, &self.location)?;

        vm.enter_reference(&resolved.key, &self.location)?;
        debug!(
            target: "jsv",
            reference = %self.reference,
            key = %resolved.key,
            path = %vm.path(),
            "expanding reference"
        );

        let result = Compiler::unchecked(resolver)
            .compile(resolved.fragment, &resolved.location)
            .map_err(ValidateError::from)
            .and_then(|schema| vm.validate(&schema, instance));

        vm.leave_reference();
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::draft::Draft;
    use crate::keywords::testing::{data_error, is_valid};
    use serde_json::json;

    #[test]
    fn local_references() {
        let schema = json!({
            "definitions": {
                "positive": {"type": "integer", "minimum": 1},
                "alias": {"$ref": "#/definitions/positive"},
            },
            "properties": {"count": {"$ref": "#/definitions/alias"}},
        });
        assert!(is_valid(Draft::V7, schema.clone(), json!({"count": 2})));

        let err = data_error(Draft::V7, schema, json!({"count": 0})).unwrap();
        assert_eq!("$.count", err.path.to_string());
    }

    #[test]
    fn escaped_pointer_tokens() {
        let schema = json!({
            "definitions": {"a/b": {"type": "string"}, "c%d": {"type": "integer"}},
            "properties": {
                "x": {"$ref": "#/definitions/a~1b"},
                "y": {"$ref": "#/definitions/c%25d"},
            },
        });
        assert!(is_valid(Draft::V7, schema.clone(), json!({"x": "s", "y": 1})));
        assert!(!is_valid(Draft::V7, schema, json!({"x": 1})));
    }

    #[test]
    fn references_into_arrays() {
        let schema = json!({
            "items": [{"type": "integer"}, {"$ref": "#/items/0"}],
        });
        assert!(is_valid(Draft::V7, schema.clone(), json!([1, 2])));
        assert!(!is_valid(Draft::V7, schema, json!([1, "2"])));
    }

    #[test]
    fn diamonds_are_not_cycles() {
        let schema = json!({
            "definitions": {
                "leaf": {"type": "string"},
                "left": {"$ref": "#/definitions/leaf"},
                "right": {"$ref": "#/definitions/leaf"},
            },
            "allOf": [{"$ref": "#/definitions/left"}, {"$ref": "#/definitions/right"}],
        });
        assert!(is_valid(Draft::V7, schema.clone(), json!("x")));
        assert!(!is_valid(Draft::V7, schema, json!(1)));
    }
}
