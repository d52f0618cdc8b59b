//! Turns schema documents into trees of keyword validators.

use crate::draft::Draft;
use crate::error::{SchemaDefinitionError, SchemaErrorKind};
use crate::keywords::{self, Keyword};
use crate::path::SchemaPath;
use crate::resolver::Resolver;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Keywords that only describe a schema and never constrain a value.
const ANNOTATIONS: &[&str] = &[
    "$schema",
    "$id",
    "id",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "definitions",
    "readOnly",
    "writeOnly",
];

/// The validators compiled from one schema fragment, in document order.
///
/// A compiled schema holds no reference to the resolver it was compiled
/// with and never changes after compilation, so one instance can be shared
/// by any number of concurrent validations.
#[derive(Debug)]
pub struct CompiledSchema {
    location: SchemaPath,
    keywords: Vec<Keyword>,
}

impl CompiledSchema {
    /// Where in its document this schema was compiled from.
    pub fn location(&self) -> &SchemaPath {
        &self.location
    }

    /// The number of validators in this schema, not counting nested ones.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub(crate) fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }
}

pub struct Compiler<'r> {
    resolver: &'r Resolver,
    check_references: bool,
    checked_references: HashSet<String>,
}

impl<'r> Compiler<'r> {
    /// A compiler that resolves and compiles the target of every `$ref` it
    /// meets, so that broken references fail before any data is checked.
    pub fn new(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            check_references: true,
            checked_references: HashSet::new(),
        }
    }

    /// A compiler for fragments whose references were already checked.
    pub(crate) fn unchecked(resolver: &'r Resolver) -> Self {
        Self {
            resolver,
            check_references: false,
            checked_references: HashSet::new(),
        }
    }

    pub fn draft(&self) -> Draft {
        self.resolver.draft()
    }

    pub fn resolver(&self) -> &'r Resolver {
        self.resolver
    }

    /// Compiles a schema fragment found at `location`.
    ///
    /// `true` and `false` are schemas from draft 6 on. A document that is a
    /// bare boolean is accepted under every dialect.
    pub fn compile(
        &mut self,
        schema: &Value,
        location: &SchemaPath,
    ) -> Result<CompiledSchema, SchemaDefinitionError> {
        let keywords = match schema {
            Value::Bool(b) if self.draft().is_v6_or_later() || location.path.is_empty() => {
                vec![Keyword::Boolean(*b)]
            }
            Value::Object(map) => self.compile_object(map, location)?,
            _ => {
                let expected = if self.draft().is_v6_or_later() {
                    "an object or a boolean"
                } else {
                    "an object"
                };

                return Err(SchemaDefinitionError::new(
                    location.clone(),
                    SchemaErrorKind::InvalidSchema { expected },
                ));
            }
        };

        Ok(CompiledSchema {
            location: location.clone(),
            keywords,
        })
    }

    fn compile_object(
        &mut self,
        map: &Map<String, Value>,
        location: &SchemaPath,
    ) -> Result<Vec<Keyword>, SchemaDefinitionError> {
        // Every supported draft ignores the siblings of `$ref`.
        if let Some(reference) = map.get("$ref") {
            let reference =
                keywords::Reference::compile(reference, &location.property("$ref"), self)?;
            return Ok(vec![Keyword::Reference(reference)]);
        }

        let draft = self.draft();
        let mut out = Vec::with_capacity(map.len());

        for (name, value) in map {
            let path = location.property(name.as_str());
            let keyword = match name.as_str() {
                "type" => Some(Keyword::Type(keywords::Type::compile(value, "type", &path, self)?)),
                "enum" => Some(Keyword::Enum(keywords::Enum::compile(value, &path)?)),
                "minimum" | "maximum" => Some(Keyword::Bound(keywords::Bound::compile(
                    name, value, map, &path, draft,
                )?)),
                "exclusiveMinimum" | "exclusiveMaximum" => {
                    keywords::Bound::compile_exclusive(name, value, map, &path, draft)?
                        .map(Keyword::Bound)
                }
                "minLength" => Some(Keyword::MinLength(keywords::non_negative(
                    value,
                    "minLength",
                    &path,
                )?)),
                "maxLength" => Some(Keyword::MaxLength(keywords::non_negative(
                    value,
                    "maxLength",
                    &path,
                )?)),
                "pattern" => Some(Keyword::Pattern(keywords::Pattern::compile(
                    value, &path, self,
                )?)),
                "format" => keywords::Format::compile(value, &path, draft)?.map(Keyword::Format),
                "items" => Some(Keyword::Items(keywords::Items::compile(
                    value, map, &path, self,
                )?)),
                "additionalItems" => {
                    // Only meaningful beside a tuple `items`, which consumes it.
                    if !map.get("items").map_or(false, Value::is_array) {
                        keywords::Additional::compile(value, "additionalItems", &path, self)?;
                    }
                    None
                }
                "minItems" => Some(Keyword::MinItems(keywords::non_negative(
                    value, "minItems", &path,
                )?)),
                "maxItems" => Some(Keyword::MaxItems(keywords::non_negative(
                    value, "maxItems", &path,
                )?)),
                "uniqueItems" => {
                    if keywords::unique_items(value, &path)? {
                        Some(Keyword::UniqueItems)
                    } else {
                        None
                    }
                }
                "properties" => Some(Keyword::Properties(keywords::Properties::compile(
                    value, &path, self,
                )?)),
                "patternProperties" => Some(Keyword::PatternProperties(
                    keywords::PatternProperties::compile(value, &path, self)?,
                )),
                "additionalProperties" => Some(Keyword::AdditionalProperties(
                    keywords::AdditionalProperties::compile(value, map, &path, self)?,
                )),
                "dependencies" => Some(Keyword::Dependencies(keywords::Dependencies::compile(
                    value, &path, self,
                )?)),
                "required" => keywords::Required::compile(value, &path, draft)?.map(Keyword::Required),
                "disallow" | "extends" | "divisibleBy" => match draft {
                    Draft::V3 => Some(self.compile_draft3_keyword(name, value, &path)?),
                    Draft::Simple => return Err(unsupported(name, &path, draft)),
                    _ => None,
                },
                "multipleOf" | "allOf" | "anyOf" | "oneOf" | "not" | "minProperties"
                | "maxProperties" => {
                    if draft == Draft::V3 {
                        return Err(unsupported(name, &path, draft));
                    }
                    Some(self.compile_draft4_keyword(name, value, &path)?)
                }
                "const" | "contains" | "propertyNames" => {
                    if !draft.is_v6_or_later() {
                        return Err(unsupported(name, &path, draft));
                    }
                    Some(self.compile_draft6_keyword(name, value, &path)?)
                }
                "if" | "then" | "else" | "contentEncoding" | "contentMediaType" => {
                    if draft != Draft::V7 {
                        return Err(unsupported(name, &path, draft));
                    }
                    self.compile_draft7_keyword(name, value, map, &path)?
                }
                _ if ANNOTATIONS.contains(&name.as_str()) => None,
                _ if draft == Draft::Simple => return Err(unsupported(name, &path, draft)),
                _ => None,
            };

            out.extend(keyword);
        }

        Ok(out)
    }

    fn compile_draft3_keyword(
        &mut self,
        name: &str,
        value: &Value,
        path: &SchemaPath,
    ) -> Result<Keyword, SchemaDefinitionError> {
        Ok(match name {
            "disallow" => Keyword::Disallow(keywords::Type::compile(value, "disallow", path, self)?),
            "extends" => Keyword::Extends(keywords::Extends::compile(value, path, self)?),
            _ => Keyword::MultipleOf(keywords::MultipleOf::compile(value, "divisibleBy", path)?),
        })
    }

    fn compile_draft4_keyword(
        &mut self,
        name: &str,
        value: &Value,
        path: &SchemaPath,
    ) -> Result<Keyword, SchemaDefinitionError> {
        Ok(match name {
            "multipleOf" => {
                Keyword::MultipleOf(keywords::MultipleOf::compile(value, "multipleOf", path)?)
            }
            "allOf" => Keyword::AllOf(keywords::AllOf::compile(value, path, self)?),
            "anyOf" => Keyword::AnyOf(keywords::AnyOf::compile(value, path, self)?),
            "oneOf" => Keyword::OneOf(keywords::OneOf::compile(value, path, self)?),
            "not" => Keyword::Not(keywords::Not::compile(value, path, self)?),
            "minProperties" => {
                Keyword::MinProperties(keywords::non_negative(value, "minProperties", path)?)
            }
            _ => Keyword::MaxProperties(keywords::non_negative(value, "maxProperties", path)?),
        })
    }

    fn compile_draft6_keyword(
        &mut self,
        name: &str,
        value: &Value,
        path: &SchemaPath,
    ) -> Result<Keyword, SchemaDefinitionError> {
        Ok(match name {
            "const" => Keyword::Const(value.clone()),
            "contains" => Keyword::Contains(Box::new(self.compile(value, path)?)),
            _ => Keyword::PropertyNames(Box::new(self.compile(value, path)?)),
        })
    }

    fn compile_draft7_keyword(
        &mut self,
        name: &str,
        value: &Value,
        siblings: &Map<String, Value>,
        path: &SchemaPath,
    ) -> Result<Option<Keyword>, SchemaDefinitionError> {
        Ok(match name {
            "if" => Some(Keyword::Conditional(keywords::Conditional::compile(
                value, siblings, path, self,
            )?)),
            // `then` and `else` are compiled by their `if`, and mean
            // nothing without one.
            "then" | "else" => {
                if !siblings.contains_key("if") {
                    self.compile(value, path)?;
                }
                None
            }
            "contentEncoding" => {
                keywords::ContentEncoding::compile(value, path)?.map(Keyword::ContentEncoding)
            }
            _ => keywords::ContentMediaType::compile(value, siblings, path)?
                .map(Keyword::ContentMediaType),
        })
    }

    /// Compiles a non-empty array of sub-schemas.
    pub(crate) fn compile_schema_array(
        &mut self,
        value: &Value,
        keyword: &'static str,
        path: &SchemaPath,
    ) -> Result<Vec<CompiledSchema>, SchemaDefinitionError> {
        let items = value.as_array().ok_or_else(|| {
            SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::InvalidKeywordValue {
                    keyword,
                    expected: "an array of schemas",
                },
            )
        })?;

        if items.is_empty() {
            return Err(SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::EmptyKeywordValue { keyword },
            ));
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.compile(item, &path.index(i)))
            .collect()
    }

    /// Compiles an object whose values are all sub-schemas.
    pub(crate) fn compile_schema_map(
        &mut self,
        value: &Value,
        keyword: &'static str,
        path: &SchemaPath,
    ) -> Result<Vec<(String, CompiledSchema)>, SchemaDefinitionError> {
        let map = value.as_object().ok_or_else(|| {
            SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::InvalidKeywordValue {
                    keyword,
                    expected: "an object of schemas",
                },
            )
        })?;

        map.iter()
            .map(|(name, schema)| {
                let schema = self.compile(schema, &path.property(name.as_str()))?;
                Ok((name.clone(), schema))
            })
            .collect()
    }

    pub(crate) fn regex(
        &self,
        pattern: &str,
        path: &SchemaPath,
    ) -> Result<Regex, SchemaDefinitionError> {
        Regex::new(pattern).map_err(|err| {
            SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::InvalidRegex {
                    pattern: pattern.to_owned(),
                    message: err.to_string(),
                },
            )
        })
    }

    /// Records that the reference target `key` is about to be checked.
    /// Returns false when it needs no checking, either because this
    /// compiler does not check references or because it was already seen.
    pub(crate) fn should_check_reference(&mut self, key: &str) -> bool {
        self.check_references && self.checked_references.insert(key.to_owned())
    }
}

fn unsupported(keyword: &str, path: &SchemaPath, draft: Draft) -> SchemaDefinitionError {
    SchemaDefinitionError::new(
        path.clone(),
        SchemaErrorKind::UnsupportedKeyword {
            keyword: keyword.to_owned(),
            draft,
        },
    )
}
