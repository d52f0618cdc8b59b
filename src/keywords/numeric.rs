use crate::draft::Draft;
use crate::error::{DataErrorKind, SchemaDefinitionError, SchemaErrorKind, ValidateError};
use crate::json;
use crate::path::SchemaPath;
use crate::validate::Vm;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

use super::invalid_value;

/// A lower or upper limit on numbers.
///
/// Up to draft 4, exclusivity is a boolean `exclusiveMinimum` beside
/// `minimum`. From draft 6 on, `exclusiveMinimum` is a limit of its own.
#[derive(Debug)]
pub(crate) struct Bound {
    keyword: &'static str,
    limit: Number,
    lower: bool,
    exclusive: bool,
}

impl Bound {
    /// Compiles `minimum` or `maximum`.
    pub fn compile(
        keyword: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
        draft: Draft,
    ) -> Result<Self, SchemaDefinitionError> {
        let (keyword, exclusive_keyword, lower) = if keyword == "minimum" {
            ("minimum", "exclusiveMinimum", true)
        } else {
            ("maximum", "exclusiveMaximum", false)
        };

        let limit = number(value, keyword, path)?;
        let exclusive = if draft.is_v6_or_later() {
            false
        } else {
            match siblings.get(exclusive_keyword) {
                None => false,
                Some(Value::Bool(exclusive)) => *exclusive,
                Some(_) => {
                    return Err(invalid_value(
                        &path.sibling(exclusive_keyword),
                        exclusive_keyword,
                        "a boolean",
                    ))
                }
            }
        };

        Ok(Self {
            keyword,
            limit,
            lower,
            exclusive,
        })
    }

    /// Compiles `exclusiveMinimum` or `exclusiveMaximum`. Before draft 6
    /// these only modify their `minimum` or `maximum` sibling and compile
    /// to nothing.
    pub fn compile_exclusive(
        keyword: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
        draft: Draft,
    ) -> Result<Option<Self>, SchemaDefinitionError> {
        let (keyword, bound_keyword, lower) = if keyword == "exclusiveMinimum" {
            ("exclusiveMinimum", "minimum", true)
        } else {
            ("exclusiveMaximum", "maximum", false)
        };

        if draft.is_v6_or_later() {
            return Ok(Some(Self {
                keyword,
                limit: number(value, keyword, path)?,
                lower,
                exclusive: true,
            }));
        }

        if !value.is_boolean() {
            return Err(invalid_value(path, keyword, "a boolean"));
        }

        if !siblings.contains_key(bound_keyword) {
            return Err(SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::MissingSibling {
                    keyword,
                    sibling: bound_keyword,
                },
            ));
        }

        Ok(None)
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let value = match instance {
            Value::Number(n) => n,
            _ => return Ok(()),
        };

        let ordering = json::compare_numbers(value, &self.limit);
        let ok = match (self.lower, self.exclusive) {
            (true, false) => ordering != Ordering::Less,
            (true, true) => ordering == Ordering::Greater,
            (false, false) => ordering != Ordering::Greater,
            (false, true) => ordering == Ordering::Less,
        };

        if ok {
            return Ok(());
        }

        let limit = Value::Number(self.limit.clone());
        let value = instance.clone();
        vm.fail(if self.lower {
            DataErrorKind::Minimum {
                limit,
                exclusive: self.exclusive,
                value,
            }
        } else {
            DataErrorKind::Maximum {
                limit,
                exclusive: self.exclusive,
                value,
            }
        })
    }
}

/// `multipleOf`, spelled `divisibleBy` in draft 3.
#[derive(Debug)]
pub(crate) struct MultipleOf {
    keyword: &'static str,
    divisor: Number,
}

impl MultipleOf {
    pub fn compile(
        value: &Value,
        keyword: &'static str,
        path: &SchemaPath,
    ) -> Result<Self, SchemaDefinitionError> {
        let divisor = number(value, keyword, path)?;
        if divisor.as_f64().map_or(true, |d| d <= 0.0) {
            return Err(invalid_value(path, keyword, "a number greater than 0"));
        }

        Ok(Self { keyword, divisor })
    }

    pub fn keyword(&self) -> &'static str {
        self.keyword
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        let value = match instance {
            Value::Number(n) => n,
            _ => return Ok(()),
        };

        if is_multiple(value, &self.divisor) {
            Ok(())
        } else {
            vm.fail(DataErrorKind::MultipleOf {
                divisor: Value::Number(self.divisor.clone()),
                value: instance.clone(),
            })
        }
    }
}

fn as_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn is_multiple(value: &Number, divisor: &Number) -> bool {
    if let (Some(value), Some(divisor)) = (as_i128(value), as_i128(divisor)) {
        return value % divisor == 0;
    }

    match (value.as_f64(), divisor.as_f64()) {
        (Some(value), Some(divisor)) => {
            // Decimal inputs such as 0.3 / 0.1 miss the integer by a few ulps
            // of the quotient, so the slack scales with it.
            let quotient = value / divisor;
            quotient.is_finite()
                && (quotient - quotient.round()).abs()
                    <= 4.0 * f64::EPSILON * quotient.abs().max(1.0)
        }
        _ => false,
    }
}

fn number(value: &Value, keyword: &'static str, path: &SchemaPath) -> Result<Number, SchemaDefinitionError> {
    match value {
        Value::Number(n) => Ok(n.clone()),
        _ => Err(invalid_value(path, keyword, "a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn n(value: Value) -> Number {
        match value {
            Value::Number(n) => n,
            other => panic!("not a number: {}", other),
        }
    }

    #[test]
    fn multiples() {
        assert!(is_multiple(&n(json!(10)), &n(json!(5))));
        assert!(!is_multiple(&n(json!(10)), &n(json!(3))));
        assert!(is_multiple(&n(json!(0.3)), &n(json!(0.1))));
        assert!(is_multiple(&n(json!(4.5)), &n(json!(1.5))));
        assert!(!is_multiple(&n(json!(4.6)), &n(json!(1.5))));
        assert!(is_multiple(&n(json!(u64::MAX)), &n(json!(1))));
        assert!(is_multiple(&n(json!(19.99)), &n(json!(0.01))));
        assert!(is_multiple(&n(json!(1e300)), &n(json!(1e-5))));
    }

    #[test]
    fn tiny_values_are_not_multiples() {
        assert!(!is_multiple(&n(json!(1e-10)), &n(json!(1))));
        assert!(!is_multiple(&n(json!(1e-12)), &n(json!(0.01))));
        assert!(!is_multiple(&n(json!(2.0000001)), &n(json!(2))));
        assert!(is_multiple(&n(json!(0.0)), &n(json!(0.01))));
    }

    #[test]
    fn exclusive_flags_need_their_bound() {
        let path = SchemaPath::root(None).property("exclusiveMinimum");
        let siblings = json!({"exclusiveMinimum": true});
        assert_eq!(
            SchemaErrorKind::MissingSibling {
                keyword: "exclusiveMinimum",
                sibling: "minimum"
            },
            Bound::compile_exclusive(
                "exclusiveMinimum",
                &json!(true),
                siblings.as_object().unwrap(),
                &path,
                Draft::V4
            )
            .unwrap_err()
            .kind
        );
    }

    #[test]
    fn exclusive_shape_follows_the_draft() {
        let path = SchemaPath::root(None).property("exclusiveMaximum");
        let siblings = json!({"maximum": 3, "exclusiveMaximum": 3});
        let siblings = siblings.as_object().unwrap();

        assert!(Bound::compile_exclusive("exclusiveMaximum", &json!(3), siblings, &path, Draft::V4)
            .is_err());
        assert!(Bound::compile_exclusive("exclusiveMaximum", &json!(3), siblings, &path, Draft::V7)
            .unwrap()
            .is_some());
        assert!(
            Bound::compile_exclusive("exclusiveMaximum", &json!(true), siblings, &path, Draft::V6)
                .is_err()
        );
    }

    #[test]
    fn non_positive_divisors() {
        let path = SchemaPath::root(None).property("multipleOf");
        assert!(MultipleOf::compile(&json!(0), "multipleOf", &path).is_err());
        assert!(MultipleOf::compile(&json!(-2), "multipleOf", &path).is_err());
        assert!(MultipleOf::compile(&json!("2"), "multipleOf", &path).is_err());
        assert!(MultipleOf::compile(&json!(0.5), "multipleOf", &path).is_ok());
    }
}
