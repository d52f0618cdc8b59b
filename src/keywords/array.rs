use crate::compiler::{CompiledSchema, Compiler};
use crate::error::{DataErrorKind, SchemaDefinitionError, ValidateError};
use crate::json;
use crate::path::SchemaPath;
use crate::validate::Vm;
use serde_json::{Map, Value};

use super::invalid_value;

/// What happens to elements (or properties) that nothing else describes.
#[derive(Debug)]
pub(crate) enum Additional {
    Allowed(bool),
    Schema(Box<CompiledSchema>),
}

impl Additional {
    /// Compiles `additionalItems` or `additionalProperties`. Before draft 6
    /// booleans are not schemas, but both keywords accept them anyway.
    pub fn compile(
        value: &Value,
        keyword: &'static str,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        match value {
            Value::Bool(allowed) => Ok(Additional::Allowed(*allowed)),
            Value::Object(_) => Ok(Additional::Schema(Box::new(compiler.compile(value, path)?))),
            _ => Err(invalid_value(path, keyword, "a boolean or a schema")),
        }
    }
}

/// `items`, with `additionalItems` folded in when `items` is a tuple.
#[derive(Debug)]
pub(crate) enum Items {
    Single(Box<CompiledSchema>),
    Tuple {
        items: Vec<CompiledSchema>,
        additional: Additional,
    },
}

impl Items {
    pub fn compile(
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
        compiler: &mut Compiler,
    ) -> Result<Self, SchemaDefinitionError> {
        let tuple = match value {
            Value::Array(tuple) => tuple,
            _ => return Ok(Items::Single(Box::new(compiler.compile(value, path)?))),
        };

        let items = tuple
            .iter()
            .enumerate()
            .map(|(i, item)| compiler.compile(item, &path.index(i)))
            .collect::<Result<_, _>>()?;

        let additional = match siblings.get("additionalItems") {
            Some(value) => Additional::compile(
                value,
                "additionalItems",
                &path.sibling("additionalItems"),
                compiler,
            )?,
            None => Additional::Allowed(true),
        };

        Ok(Items::Tuple { items, additional })
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let elements = match instance {
            Value::Array(elements) => elements,
            _ => return Ok(()),
        };

        match self {
            Items::Single(schema) => {
                for (i, element) in elements.iter().enumerate() {
                    vm.validate_item(schema, i, element)?;
                }
            }

            Items::Tuple { items, additional } => {
                for (i, element) in elements.iter().enumerate() {
                    match (items.get(i), additional) {
                        (Some(schema), _) => vm.validate_item(schema, i, element)?,
                        (None, Additional::Allowed(true)) => break,
                        (None, Additional::Allowed(false)) => {
                            return vm.fail(DataErrorKind::AdditionalItems { limit: items.len() })
                        }
                        (None, Additional::Schema(schema)) => vm.validate_item(schema, i, element)?,
                    }
                }
            }
        }

        Ok(())
    }
}

/// Reads `uniqueItems`. Only `true` compiles to a validator.
pub(crate) fn unique_items(value: &Value, path: &SchemaPath) -> Result<bool, SchemaDefinitionError> {
    value
        .as_bool()
        .ok_or_else(|| invalid_value(path, "uniqueItems", "a boolean"))
}

pub(crate) fn validate_min_items(
    limit: usize,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    match instance {
        Value::Array(elements) if elements.len() < limit => vm.fail(DataErrorKind::MinItems {
            limit,
            count: elements.len(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn validate_max_items(
    limit: usize,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    match instance {
        Value::Array(elements) if elements.len() > limit => vm.fail(DataErrorKind::MaxItems {
            limit,
            count: elements.len(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn validate_unique_items(vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
    let elements = match instance {
        Value::Array(elements) => elements,
        _ => return Ok(()),
    };

    for (first, a) in elements.iter().enumerate() {
        for (offset, b) in elements[first + 1..].iter().enumerate() {
            if json::equal(a, b) {
                return vm.fail(DataErrorKind::UniqueItems {
                    first,
                    second: first + 1 + offset,
                });
            }
        }
    }

    Ok(())
}

/// `contains`: some element must match. An empty array has none that do.
pub(crate) fn validate_contains(
    schema: &CompiledSchema,
    vm: &mut Vm,
    instance: &Value,
) -> Result<(), ValidateError> {
    let elements = match instance {
        Value::Array(elements) => elements,
        _ => return Ok(()),
    };

    for (index, element) in elements.iter().enumerate() {
        if vm.probe_item(schema, index, element)? {
            return Ok(());
        }
    }

    vm.fail(DataErrorKind::Contains)
}
