use crate::compiler::{CompiledSchema, Compiler};
use crate::draft::Draft;
use crate::error::{Error, SchemaDefinitionError, SchemaErrorKind};
use crate::json::{self, Encoding, JsonError};
use crate::options::Options;
use crate::path::{DataPath, SchemaPath};
use crate::resolver::Resolver;
use crate::validate;
use serde_json::Value;
use tracing::debug;

/// A schema document, in any of the forms a caller may hold it in.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaSource {
    Value(Value),
    Bool(bool),
    /// Raw JSON text. Without an explicit encoding, the encoding is sniffed.
    Bytes {
        bytes: Vec<u8>,
        encoding: Option<Encoding>,
    },
}

impl SchemaSource {
    pub fn into_value(self) -> Result<Value, JsonError> {
        match self {
            SchemaSource::Value(value) => Ok(value),
            SchemaSource::Bool(b) => Ok(Value::Bool(b)),
            SchemaSource::Bytes { bytes, encoding } => json::parse(&bytes, encoding),
        }
    }
}

impl From<Value> for SchemaSource {
    fn from(value: Value) -> Self {
        SchemaSource::Value(value)
    }
}

impl From<bool> for SchemaSource {
    fn from(b: bool) -> Self {
        SchemaSource::Bool(b)
    }
}

impl From<&[u8]> for SchemaSource {
    fn from(bytes: &[u8]) -> Self {
        SchemaSource::Bytes {
            bytes: bytes.to_vec(),
            encoding: None,
        }
    }
}

impl From<&str> for SchemaSource {
    fn from(text: &str) -> Self {
        SchemaSource::Bytes {
            bytes: text.as_bytes().to_vec(),
            encoding: Some(Encoding::Utf8),
        }
    }
}

/// A compiled schema, ready to validate any number of instances.
///
/// ```
/// use jsv::JsonSchema;
/// use serde_json::json;
///
/// let schema = JsonSchema::new(json!({
///     "$schema": "http://json-schema.org/draft-04/schema#",
///     "minimum": 1,
///     "exclusiveMinimum": true,
/// }))
/// .unwrap();
///
/// assert!(schema.validate(&json!(1)).is_err());
/// assert!(schema.validate(&json!(2)).is_ok());
/// ```
#[derive(Debug)]
pub struct JsonSchema {
    resolver: Resolver,
    schema: CompiledSchema,
}

impl JsonSchema {
    pub fn new(source: impl Into<SchemaSource>) -> Result<Self, SchemaDefinitionError> {
        Self::with_options(source, Options::new())
    }

    /// Compiles `source`. The dialect is, in order of precedence: the
    /// simple dialect if requested, the explicit draft of `options`, the
    /// draft named by `$schema`, and finally the default draft.
    ///
    /// Every reference is checked here, so a schema that compiles has no
    /// dangling references.
    pub fn with_options(
        source: impl Into<SchemaSource>,
        options: Options,
    ) -> Result<Self, SchemaDefinitionError> {
        let root = parse_document(source.into(), None)?;

        let draft = if options.simple_mode() {
            Draft::Simple
        } else {
            options
                .draft()
                .or_else(|| Draft::detect(&root))
                .unwrap_or_else(|| options.default_draft())
        };

        let mut documents = Vec::new();
        for (id, source) in options.into_dependencies() {
            let document = parse_document(source, Some(&id))?;
            documents.push((id, document));
        }

        let resolver = Resolver::new(draft, root, documents);
        debug!(
            target: "jsv",
            draft = %draft,
            dependencies = resolver.document_count(),
            "compiling schema"
        );

        let schema = Compiler::new(&resolver).compile(resolver.root(), &SchemaPath::root(None))?;
        Ok(Self { resolver, schema })
    }

    pub fn draft(&self) -> Draft {
        self.resolver.draft()
    }

    /// Validates `instance`, handing it back on success.
    pub fn validate<'v>(&self, instance: &'v Value) -> Result<&'v Value, Error> {
        validate::validate(&self.schema, &self.resolver, instance, DataPath::root())?;
        Ok(instance)
    }

    /// Parses `bytes` as JSON and validates the result.
    pub fn validate_bytes(&self, bytes: &[u8], encoding: Option<Encoding>) -> Result<Value, Error> {
        let instance = json::parse(bytes, encoding)?;
        self.validate(&instance)?;
        Ok(instance)
    }

    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validate(instance).is_ok()
    }
}

fn parse_document(source: SchemaSource, id: Option<&str>) -> Result<Value, SchemaDefinitionError> {
    source.into_value().map_err(|err| {
        SchemaDefinitionError::new(
            SchemaPath::root(id.map(str::to_owned)),
            SchemaErrorKind::Json(err),
        )
    })
}
