//! A JSON Schema validator for drafts 3, 4, 6 and 7, plus a strict "simple"
//! dialect.
//!
//! A [`JsonSchema`] is compiled once from a schema document and can then
//! validate any number of instances. Failures are typed: a broken schema is
//! a [`SchemaDefinitionError`] located by a [`SchemaPath`], and an instance
//! that does not conform is a [`DataValidationError`] located by a
//! [`DataPath`].
//!
//! ```
//! use jsv::{Error, JsonSchema};
//! use serde_json::json;
//!
//! let schema = JsonSchema::new(json!({
//!     "type": "object",
//!     "properties": {"item1": {"type": "string"}},
//!     "additionalProperties": false,
//! }))
//! .unwrap();
//!
//! match schema.validate(&json!({"item1": "x", "item2": 1})) {
//!     Err(Error::Data(err)) => assert_eq!("$.item2", err.path.to_string()),
//!     other => panic!("{:?}", other),
//! }
//! ```

pub mod compiler;
mod draft;
mod error;
pub mod json;
mod keywords;
mod options;
pub mod path;
pub mod resolver;
mod schema;
pub mod validate;

pub use compiler::CompiledSchema;
pub use draft::*;
pub use error::*;
pub use json::{Encoding, JsonError};
pub use options::*;
pub use path::{DataPath, JsonPath, PathError, SchemaPath, Step};
pub use schema::*;
