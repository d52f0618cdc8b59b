use crate::compiler::CompiledSchema;
use crate::error::{
    DataErrorKind, DataValidationError, SchemaDefinitionError, SchemaErrorKind, ValidateError,
};
use crate::path::{DataPath, SchemaPath};
use crate::resolver::Resolver;
use serde_json::Value;
use tracing::{trace, warn};

/// Validates `instance`, found at `path` in its document, against `schema`.
///
/// Validators run in the order they were compiled, and the first failure is
/// the one reported.
pub fn validate(
    schema: &CompiledSchema,
    resolver: &Resolver,
    instance: &Value,
    path: DataPath,
) -> Result<(), ValidateError> {
    let mut vm = Vm {
        resolver,
        instance_path: path,
        reference_stack: vec![],
    };

    vm.validate(schema, instance)
}

/// The state of one validation run: where in the instance it is, and which
/// references are being expanded.
pub(crate) struct Vm<'r> {
    resolver: &'r Resolver,
    instance_path: DataPath,
    reference_stack: Vec<(String, usize)>,
}

impl<'r> Vm<'r> {
    pub fn resolver(&self) -> &'r Resolver {
        self.resolver
    }

    pub fn path(&self) -> &DataPath {
        &self.instance_path
    }

    pub fn validate(
        &mut self,
        schema: &CompiledSchema,
        instance: &Value,
    ) -> Result<(), ValidateError> {
        for keyword in schema.keywords() {
            if let Err(err) = keyword.validate(self, instance) {
                trace!(
                    target: "jsv",
                    keyword = keyword.name(),
                    location = %schema.location(),
                    path = %self.instance_path,
                    "keyword failed"
                );
                return Err(err);
            }
        }

        Ok(())
    }

    /// Validates the value of property `name` of the current object.
    pub fn validate_property(
        &mut self,
        schema: &CompiledSchema,
        name: &str,
        instance: &Value,
    ) -> Result<(), ValidateError> {
        self.instance_path.add_property_key(name);
        let result = self.validate(schema, instance);
        self.instance_path.remove_last_element();
        result
    }

    /// Validates element `index` of the current array.
    pub fn validate_item(
        &mut self,
        schema: &CompiledSchema,
        index: usize,
        instance: &Value,
    ) -> Result<(), ValidateError> {
        self.instance_path.add_array_index(index);
        let result = self.validate(schema, instance);
        self.instance_path.remove_last_element();
        result
    }

    /// Validates `instance` against `schema`, handing back a data failure
    /// as a value instead of propagating it. Schema failures still
    /// propagate.
    pub fn attempt(
        &mut self,
        schema: &CompiledSchema,
        instance: &Value,
    ) -> Result<Result<(), DataValidationError>, SchemaDefinitionError> {
        match self.validate(schema, instance) {
            Ok(()) => Ok(Ok(())),
            Err(ValidateError::Data(err)) => Ok(Err(err)),
            Err(ValidateError::Schema(err)) => Err(err),
        }
    }

    /// Whether element `index` of the current array satisfies `schema`.
    pub fn probe_item(
        &mut self,
        schema: &CompiledSchema,
        index: usize,
        instance: &Value,
    ) -> Result<bool, SchemaDefinitionError> {
        self.instance_path.add_array_index(index);
        let result = self.probe(schema, instance);
        self.instance_path.remove_last_element();
        result
    }

    /// Validates the name of property `name` of the current object, as a
    /// string instance. The name sits one step below the object, the same
    /// as its value.
    pub fn attempt_name(
        &mut self,
        schema: &CompiledSchema,
        name: &str,
    ) -> Result<Result<(), DataValidationError>, SchemaDefinitionError> {
        self.instance_path.add_property_key(name);
        let result = self.attempt(schema, &Value::String(name.to_owned()));
        self.instance_path.remove_last_element();
        result
    }

    /// Whether `instance` satisfies `schema`.
    pub fn probe(
        &mut self,
        schema: &CompiledSchema,
        instance: &Value,
    ) -> Result<bool, SchemaDefinitionError> {
        Ok(self.attempt(schema, instance)?.is_ok())
    }

    /// A data error at the current location.
    pub fn error(&self, kind: DataErrorKind) -> DataValidationError {
        DataValidationError::new(self.instance_path.clone(), kind)
    }

    /// Fails at the current location.
    pub fn fail(&self, kind: DataErrorKind) -> Result<(), ValidateError> {
        Err(ValidateError::Data(self.error(kind)))
    }

    /// Marks the reference target `key` as being expanded at the current
    /// location. Meeting a target again without having moved deeper into
    /// the instance can only loop forever, so it is a cyclic reference.
    pub fn enter_reference(
        &mut self,
        key: &str,
        location: &SchemaPath,
    ) -> Result<(), SchemaDefinitionError> {
        let depth = self.instance_path.len();
        if self
            .reference_stack
            .iter()
            .any(|(entered, at)| entered == key && *at == depth)
        {
            warn!(target: "jsv", key, path = %self.instance_path, "rejecting cyclic reference");
            return Err(SchemaDefinitionError::new(
                location.clone(),
                SchemaErrorKind::CyclicReference(key.to_owned()),
            ));
        }

        self.reference_stack.push((key.to_owned(), depth));
        Ok(())
    }

    pub fn leave_reference(&mut self) {
        self.reference_stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::draft::Draft;
    use serde_json::json;

    fn run(draft: Draft, schema: Value, instance: Value) -> Result<(), ValidateError> {
        let resolver = Resolver::new(draft, schema.clone(), vec![]);
        let compiled = Compiler::new(&resolver)
            .compile(&schema, &SchemaPath::root(None))
            .expect("compile schema");
        validate(&compiled, &resolver, &instance, DataPath::root())
    }

    fn data_error(draft: Draft, schema: Value, instance: Value) -> DataValidationError {
        match run(draft, schema, instance) {
            Err(ValidateError::Data(err)) => err,
            other => panic!("expected a data error, got {:?}", other),
        }
    }

    #[test]
    fn first_failure_wins() {
        let err = data_error(
            Draft::V7,
            json!({"maxLength": 2, "pattern": "^a"}),
            json!("bcd"),
        );
        assert_eq!(DataErrorKind::MaxLength { limit: 2, length: 3 }, err.kind);

        let err = data_error(
            Draft::V7,
            json!({"pattern": "^a", "maxLength": 2}),
            json!("bcd"),
        );
        assert_eq!(
            DataErrorKind::Pattern {
                pattern: "^a".to_owned()
            },
            err.kind
        );
    }

    #[test]
    fn nested_errors_carry_the_instance_path() {
        let err = data_error(
            Draft::V7,
            json!({"properties": {"a": {"items": {"type": "string"}}}}),
            json!({"a": ["x", "y", 3]}),
        );
        assert_eq!("$.a[2]", err.path.to_string());
    }

    #[test]
    fn probes_restore_the_instance_path() {
        // The first anyOf branch fails deep inside the instance; the
        // second must still see the object's own path.
        let err = data_error(
            Draft::V7,
            json!({
                "anyOf": [
                    {"properties": {"a": {"type": "string"}}},
                    {"required": ["b"]},
                ]
            }),
            json!({"a": 1}),
        );
        assert_eq!(DataPath::root(), err.path);
        assert_eq!(DataErrorKind::AnyOf, err.kind);
        assert_eq!("$.a", err.cause.unwrap().path.to_string());
    }

    #[test]
    fn cycles_without_progress_are_schema_errors() {
        let schema = json!({
            "definitions": {
                "A": {"allOf": [{"$ref": "#/definitions/B"}]},
                "B": {"allOf": [{"$ref": "#/definitions/A"}]},
            },
            "$ref": "#/definitions/A",
        });

        match run(Draft::V7, schema, json!(1)) {
            Err(ValidateError::Schema(err)) => assert!(matches!(
                err.kind,
                SchemaErrorKind::CyclicReference(_)
            )),
            other => panic!("expected a cyclic reference, got {:?}", other),
        }
    }

    #[test]
    fn recursion_that_descends_is_fine() {
        let schema = json!({
            "type": "object",
            "properties": {
                "value": {"type": "integer"},
                "next": {"$ref": "#"},
            },
        });

        assert!(run(
            Draft::V7,
            schema.clone(),
            json!({"value": 1, "next": {"value": 2, "next": {"value": 3}}})
        )
        .is_ok());

        let err = data_error(
            Draft::V7,
            schema,
            json!({"value": 1, "next": {"value": 2, "next": {"value": "x"}}}),
        );
        assert_eq!("$.next.next.value", err.path.to_string());
    }

    #[test]
    fn suite() {
        use crate::{Error, JsonSchema, Options};
        use std::collections::BTreeMap;

        #[derive(serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct TestCase {
            schema: Value,
            #[serde(default)]
            dependencies: BTreeMap<String, Value>,
            #[serde(default)]
            invalid_schema: bool,
            #[serde(default)]
            tests: Vec<Test>,
        }

        #[derive(serde::Deserialize)]
        struct Test {
            instance: Value,
            valid: bool,
            path: Option<String>,
        }

        let suites = [
            (Draft::Simple, include_str!("../suite/simple.json")),
            (Draft::V3, include_str!("../suite/draft3.json")),
            (Draft::V4, include_str!("../suite/draft4.json")),
            (Draft::V6, include_str!("../suite/draft6.json")),
            (Draft::V7, include_str!("../suite/draft7.json")),
        ];

        for (draft, suite) in suites.iter() {
            let test_cases: BTreeMap<String, TestCase> =
                serde_json::from_str(suite).expect("parse suite");

            for (test_case_name, test_case) in test_cases {
                let test_case_name = format!("{}: {}", draft, test_case_name);

                let mut options = Options::new().with_draft(*draft);
                for (id, document) in test_case.dependencies {
                    options = options.with_dependency(id, document);
                }

                let schema = JsonSchema::with_options(test_case.schema, options);
                if test_case.invalid_schema {
                    assert!(schema.is_err(), "schema should not compile: {}", test_case_name);
                    continue;
                }

                let schema = schema.expect(&test_case_name);
                for test in test_case.tests {
                    match (schema.validate(&test.instance), test.valid) {
                        (Ok(_), true) => {}
                        (Err(Error::Data(err)), false) => {
                            if let Some(path) = test.path {
                                assert_eq!(
                                    path,
                                    err.path.to_string(),
                                    "wrong error path: {} with {}",
                                    test_case_name,
                                    test.instance
                                );
                            }
                        }
                        (result, _) => panic!(
                            "wrong verdict: {} with {} gave {:?}",
                            test_case_name, test.instance, result
                        ),
                    }
                }
            }
        }
    }
}
