//! One validator per schema keyword family.
//!
//! Each validator is built once from the keyword's value (and, for a few
//! keywords, the sibling keywords beside it) and then checks any number of
//! instances. Validators that only make sense for one kind of value, such
//! as `maxLength` for strings, accept every other kind of value.

mod array;
mod combinators;
mod content;
mod format;
mod numeric;
mod object;
mod reference;
mod string;
mod types;

pub(crate) use array::{unique_items, Additional, Items};
pub(crate) use combinators::{AllOf, AnyOf, Conditional, Extends, Not, OneOf};
pub(crate) use content::{ContentEncoding, ContentMediaType};
pub(crate) use format::Format;
pub(crate) use numeric::{Bound, MultipleOf};
pub(crate) use object::{AdditionalProperties, Dependencies, PatternProperties, Properties, Required};
pub(crate) use reference::Reference;
pub(crate) use string::Pattern;
pub(crate) use types::{Enum, Type};

use crate::compiler::CompiledSchema;
use crate::error::{DataErrorKind, SchemaDefinitionError, SchemaErrorKind, ValidateError};
use crate::json;
use crate::path::SchemaPath;
use crate::validate::Vm;
use serde_json::Value;

#[derive(Debug)]
pub(crate) enum Keyword {
    Boolean(bool),
    Type(Type),
    Disallow(Type),
    Enum(Enum),
    Const(Value),
    Bound(Bound),
    MultipleOf(MultipleOf),
    MinLength(usize),
    MaxLength(usize),
    Pattern(Pattern),
    Format(Format),
    ContentEncoding(ContentEncoding),
    ContentMediaType(ContentMediaType),
    Items(Items),
    MinItems(usize),
    MaxItems(usize),
    UniqueItems,
    Contains(Box<CompiledSchema>),
    Properties(Properties),
    PatternProperties(PatternProperties),
    AdditionalProperties(AdditionalProperties),
    PropertyNames(Box<CompiledSchema>),
    Required(Required),
    Dependencies(Dependencies),
    MinProperties(usize),
    MaxProperties(usize),
    AllOf(AllOf),
    AnyOf(AnyOf),
    OneOf(OneOf),
    Not(Not),
    Conditional(Conditional),
    Extends(Extends),
    Reference(Reference),
}

impl Keyword {
    /// The schema keyword this validator was compiled from.
    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Boolean(_) => "boolean",
            Keyword::Type(_) => "type",
            Keyword::Disallow(_) => "disallow",
            Keyword::Enum(_) => "enum",
            Keyword::Const(_) => "const",
            Keyword::Bound(bound) => bound.keyword(),
            Keyword::MultipleOf(multiple_of) => multiple_of.keyword(),
            Keyword::MinLength(_) => "minLength",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::Format(_) => "format",
            Keyword::ContentEncoding(_) => "contentEncoding",
            Keyword::ContentMediaType(_) => "contentMediaType",
            Keyword::Items(_) => "items",
            Keyword::MinItems(_) => "minItems",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::UniqueItems => "uniqueItems",
            Keyword::Contains(_) => "contains",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties(_) => "additionalProperties",
            Keyword::PropertyNames(_) => "propertyNames",
            Keyword::Required(_) => "required",
            Keyword::Dependencies(_) => "dependencies",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::OneOf(_) => "oneOf",
            Keyword::Not(_) => "not",
            Keyword::Conditional(_) => "if",
            Keyword::Extends(_) => "extends",
            Keyword::Reference(_) => "$ref",
        }
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        match self {
            Keyword::Boolean(true) => Ok(()),
            Keyword::Boolean(false) => vm.fail(DataErrorKind::FalseSchema),
            Keyword::Type(type_) => type_.validate(vm, instance),
            Keyword::Disallow(type_) => type_.validate_disallow(vm, instance),
            Keyword::Enum(enum_) => enum_.validate(vm, instance),
            Keyword::Const(expected) => {
                if json::equal(expected, instance) {
                    Ok(())
                } else {
                    vm.fail(DataErrorKind::Const {
                        expected: expected.clone(),
                    })
                }
            }
            Keyword::Bound(bound) => bound.validate(vm, instance),
            Keyword::MultipleOf(multiple_of) => multiple_of.validate(vm, instance),
            Keyword::MinLength(limit) => string::validate_min_length(*limit, vm, instance),
            Keyword::MaxLength(limit) => string::validate_max_length(*limit, vm, instance),
            Keyword::Pattern(pattern) => pattern.validate(vm, instance),
            Keyword::Format(format) => format.validate(vm, instance),
            Keyword::ContentEncoding(encoding) => encoding.validate(vm, instance),
            Keyword::ContentMediaType(media_type) => media_type.validate(vm, instance),
            Keyword::Items(items) => items.validate(vm, instance),
            Keyword::MinItems(limit) => array::validate_min_items(*limit, vm, instance),
            Keyword::MaxItems(limit) => array::validate_max_items(*limit, vm, instance),
            Keyword::UniqueItems => array::validate_unique_items(vm, instance),
            Keyword::Contains(schema) => array::validate_contains(schema, vm, instance),
            Keyword::Properties(properties) => properties.validate(vm, instance),
            Keyword::PatternProperties(properties) => properties.validate(vm, instance),
            Keyword::AdditionalProperties(properties) => properties.validate(vm, instance),
            Keyword::PropertyNames(schema) => object::validate_property_names(schema, vm, instance),
            Keyword::Required(required) => required.validate(vm, instance),
            Keyword::Dependencies(dependencies) => dependencies.validate(vm, instance),
            Keyword::MinProperties(limit) => object::validate_min_properties(*limit, vm, instance),
            Keyword::MaxProperties(limit) => object::validate_max_properties(*limit, vm, instance),
            Keyword::AllOf(all_of) => all_of.validate(vm, instance),
            Keyword::AnyOf(any_of) => any_of.validate(vm, instance),
            Keyword::OneOf(one_of) => one_of.validate(vm, instance),
            Keyword::Not(not) => not.validate(vm, instance),
            Keyword::Conditional(conditional) => conditional.validate(vm, instance),
            Keyword::Extends(extends) => extends.validate(vm, instance),
            Keyword::Reference(reference) => reference.validate(vm, instance),
        }
    }
}

pub(crate) fn invalid_value(
    path: &SchemaPath,
    keyword: &'static str,
    expected: &'static str,
) -> SchemaDefinitionError {
    SchemaDefinitionError::new(
        path.clone(),
        SchemaErrorKind::InvalidKeywordValue { keyword, expected },
    )
}

/// Reads a count such as `minLength`. Whole floats like `2.0` are
/// accepted.
pub(crate) fn non_negative(
    value: &Value,
    keyword: &'static str,
    path: &SchemaPath,
) -> Result<usize, SchemaDefinitionError> {
    let count = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64)
        }),
        _ => None,
    };

    count
        .map(|count| count as usize)
        .ok_or_else(|| invalid_value(path, keyword, "a non-negative integer"))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_negative_counts() {
        let path = SchemaPath::root(None);
        assert_eq!(Ok(3), non_negative(&json!(3), "minLength", &path));
        assert_eq!(Ok(2), non_negative(&json!(2.0), "minLength", &path));
        assert!(non_negative(&json!(-1), "minLength", &path).is_err());
        assert!(non_negative(&json!(1.5), "minLength", &path).is_err());
        assert!(non_negative(&json!("1"), "minLength", &path).is_err());
    }
}
