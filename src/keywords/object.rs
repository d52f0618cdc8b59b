use crate::compiler::{CompiledSchema, Compiler};
use crate::draft::Draft;
use crate::error::{
    DataErrorKind, DataValidationError, SchemaDefinitionError, SchemaErrorKind, ValidateError,
};
use crate::path::SchemaPath;
use crate::validate::Vm;
use regex::Regex;
use serde_json::{Map, Value};

use super::array::Additional;
use super::invalid_value;

/// `properties`. In draft 3 a property schema may carry `required: true`,
/// which is checked here since the property schema only runs when the
/// property exists.
#[derive(Debug)]
pub(crate) struct Properties {
    properties: Vec<(String, CompiledSchema)>,
    required: Vec<String>,
}

impl Properties {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let properties = compiler.compile_schema_map(value, "properties", path)?;

        let required = match (compiler.draft(), value) {
            (Draft::V3, Value::Object(map)) => map
                .iter()
                .filter(|(_, schema)| schema.get("required") == Some(&Value::Bool(true)))
                .map(|(name, _)| name.clone())
                .collect(),
            _ => vec![],
        };

        Ok(Self {
            properties,
            required,
        })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let object = match instance {
            Value::Object(object) => object,
            _ => return Ok(()),
        };

        for (name, schema) in &self.properties {
            match object.get(name) {
                Some(value) => vm.validate_property(schema, name, value)?,
                None if self.required.contains(name) => {
                    return vm.fail(DataErrorKind::Required {
                        property: name.clone(),
                    })
                }
                None => {}
            }
        }

        Ok(())
    }
}

/// `patternProperties`. A property is checked against every pattern its
/// name matches.
#[derive(Debug)]
pub(crate) struct PatternProperties {
    patterns: Vec<(Regex, CompiledSchema)>,
}

impl PatternProperties {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let schemas = compiler.compile_schema_map(value, "patternProperties", path)?;

        let mut patterns = Vec::with_capacity(schemas.len());
        for (pattern, schema) in schemas {
            let regex = compiler.regex(&pattern, &path.property(pattern.as_str()))?;
            patterns.push((regex, schema));
        }

        Ok(Self { patterns })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let object = match instance {
            Value::Object(object) => object,
            _ => return Ok(()),
        };

        for (name, value) in object {
            for (regex, schema) in &self.patterns {
                if regex.is_match(name) {
                    vm.validate_property(schema, name, value)?;
                }
            }
        }

        Ok(())
    }
}

/// `additionalProperties`, which governs the properties that neither
/// `properties` nor `patternProperties` beside it cover.
#[derive(Debug)]
pub(crate) struct AdditionalProperties {
    covered: Vec<String>,
    patterns: Vec<Regex>,
    additional: Additional,
}

impl AdditionalProperties {
    pub fn compile(
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let covered = match siblings.get("properties") {
            Some(Value::Object(properties)) => properties.keys().cloned().collect(),
            _ => vec![],
        };

        let mut patterns = vec![];
        if let Some(Value::Object(pattern_properties)) = siblings.get("patternProperties") {
            let patterns_path = path.sibling("patternProperties");
            for pattern in pattern_properties.keys() {
                patterns.push(compiler.regex(pattern, &patterns_path.property(pattern.as_str()))?);
            }
        }

        Ok(Self {
            covered,
            patterns,
            additional: Additional::compile(value, "additionalProperties", path, compiler)?,
        })
    }

    fn is_covered(&self, name: &str) -> bool {
        self.covered.iter().any(|covered| covered == name)
            || self.patterns.iter().any(|regex| regex.is_match(name))
    }

    /// A forbidden property is reported at its own location.
    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let object = match instance {
            Value::Object(object) => object,
            _ => return Ok(()),
        };

        for (name, value) in object {
            if self.is_covered(name) {
                continue;
            }

            match &self.additional {
                Additional::Allowed(true) => return Ok(()),
                Additional::Allowed(false) => {
                    return Err(DataValidationError::new(
                        vm.path().property(name.as_str()),
                        DataErrorKind::AdditionalProperty {
                            property: name.clone(),
                        },
                    )
                    .into())
                }
                Additional::Schema(schema) => vm.validate_property(schema, name, value)?,
            }
        }

        Ok(())
    }
}

/// `propertyNames`: every property name, as a string instance, must match.
pub(crate) fn validate_property_names(
    schema: &CompiledSchema,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    let object = match instance {
        Value::Object(object) => object,
        _ => return Ok(()),
    };

    for name in object.keys() {
        if let Err(cause) = vm.attempt_name(schema, name)? {
            let err = vm.error(DataErrorKind::PropertyName { name: name.clone() });
            return Err(err.with_cause(cause).into());
        }
    }

    Ok(())
}

pub(crate) fn validate_min_properties(
    limit: usize,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    match instance {
        Value::Object(object) if object.len() < limit => vm.fail(DataErrorKind::MinProperties {
            limit,
            count: object.len(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn validate_max_properties(
    limit: usize,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    match instance {
        Value::Object(object) if object.len() > limit => vm.fail(DataErrorKind::MaxProperties {
            limit,
            count: object.len(),
        }),
        _ => Ok(()),
    }
}

/// `required` as a list of property names. Draft 3 spells it as a boolean
/// inside each property schema instead, which compiles to nothing here.
#[derive(Debug)]
pub(crate) struct Required {
    properties: Vec<String>,
}

impl Required {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        draft: Draft,
    ) -> Result<Option<Self>, SchemaDefinitionError> {
        if draft == Draft::V3 {
            return match value {
                Value::Bool(_) => Ok(None),
                _ => Err(invalid_value(path, "required", "a boolean")),
            };
        }

        let properties = string_array(value, "required", path)?;
        if properties.is_empty() && !draft.is_v6_or_later() {
            return Err(SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::EmptyKeywordValue { keyword: "required" },
            ));
        }

        Ok(Some(Self { properties }))
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let object = match instance {
            Value::Object(object) => object,
            _ => return Ok(()),
        };

        match self.properties.iter().find(|name| !object.contains_key(*name)) {
            Some(missing) => vm.fail(DataErrorKind::Required {
                property: missing.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
enum Dependency {
    Properties(Vec<String>),
    Schema(CompiledSchema),
}

/// `dependencies`: when the trigger property is present, either the listed
/// properties must be too, or the whole object must match a schema.
#[derive(Debug)]
pub(crate) struct Dependencies {
    dependencies: Vec<(String, Dependency)>,
}

impl Dependencies {
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let map = value
            .as_object()
            .ok_or_else(|| invalid_value(path, "dependencies", "an object"))?;

        let mut dependencies = Vec::with_capacity(map.len());
        for (trigger, dependency) in map {
            let path = path.property(trigger.as_str());
            let dependency = match dependency {
                Value::Array(_) => {
                    Dependency::Properties(string_array(dependency, "dependencies", &path)?)
                }
                Value::String(name) if compiler.draft() == Draft::V3 => {
                    Dependency::Properties(vec![name.clone()])
                }
                _ => Dependency::Schema(compiler.compile(dependency, &path)?),
            };

            dependencies.push((trigger.clone(), dependency));
        }

        Ok(Self { dependencies })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let object = match instance {
            Value::Object(object) => object,
            _ => return Ok(()),
        };

        for (trigger, dependency) in &self.dependencies {
            if !object.contains_key(trigger) {
                continue;
            }

            match dependency {
                Dependency::Properties(names) => {
                    if let Some(missing) = names.iter().find(|name| !object.contains_key(*name)) {
                        return vm.fail(DataErrorKind::Dependency {
                            trigger: trigger.clone(),
                            missing: Some(missing.clone()),
                        });
                    }
                }

                Dependency::Schema(schema) => {
                    if let Err(cause) = vm.attempt(schema, instance)? {
                        let err = vm.error(DataErrorKind::Dependency {
                            trigger: trigger.clone(),
                            missing: None,
                        });
                        return Err(err.with_cause(cause).into());
                    }
                }
            }
        }

        Ok(())
    }
}

fn string_array(
    value: &Value,
    keyword: &'static str,
    path: &SchemaPath,
) -> Result<Vec<String>, SchemaDefinitionError> {
    let expected = "an array of strings";
    value
        .as_array()
        .ok_or_else(|| invalid_value(path, keyword, expected))?
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_owned)
                .ok_or_else(|| invalid_value(path, keyword, expected))
        })
        .collect()
}
