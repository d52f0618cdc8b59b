//! Resolution of `$ref` strings against the root schema and the named
//! documents it depends on.
//!
//! A reference takes one of three shapes:
//!
//! * `#/definitions/a`, a pointer into the document holding the reference;
//! * `other.json#/definitions/a`, a pointer into a registered document;
//! * `other.json`, the whole of a registered document.
//!
//! A fragment whose only meaning is another `$ref` is followed until a
//! real schema is reached. Every hop is pushed on a resolution stack, and
//! meeting the same `document#pointer` twice is a cyclic reference.

use crate::draft::Draft;
use crate::error::{SchemaDefinitionError, SchemaErrorKind};
use crate::path::{JsonPath, SchemaPath};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{trace, warn};

/// A schema fragment located by [`Resolver::resolve`].
#[derive(Debug)]
pub struct Resolved<'r> {
    pub fragment: &'r Value,
    pub location: SchemaPath,
    /// The `document#pointer` identity of the fragment.
    pub key: String,
}

#[derive(Debug)]
pub struct Resolver {
    draft: Draft,
    root: Value,
    documents: HashMap<String, Value>,
    aliases: HashMap<String, String>,
}

impl Resolver {
    /// Builds a resolver over a root schema and its named dependencies.
    /// Documents are also reachable through their top-level `$id` (or `id`
    /// for drafts 3 and 4).
    pub fn new(draft: Draft, root: Value, documents: Vec<(String, Value)>) -> Self {
        let mut aliases = HashMap::new();
        let id_keyword = draft.id_keyword();

        let mut registry = HashMap::new();
        for (name, document) in documents {
            if let Some(id) = document.get(id_keyword).and_then(Value::as_str) {
                let id = id.trim_end_matches('#');
                if !id.is_empty() && id != name {
                    aliases.insert(id.to_owned(), name.clone());
                }
            }

            registry.insert(name, document);
        }

        Self {
            draft,
            root,
            documents: registry,
            aliases,
        }
    }

    pub fn draft(&self) -> Draft {
        self.draft
    }

    pub fn is_simple_mode(&self) -> bool {
        self.draft == Draft::Simple
    }

    pub fn is_draft_v3_mode(&self) -> bool {
        self.draft == Draft::V3
    }

    pub fn is_draft_v4_mode(&self) -> bool {
        self.draft == Draft::V4
    }

    pub fn is_draft_v6_mode(&self) -> bool {
        self.draft == Draft::V6
    }

    pub fn is_draft_v7_mode(&self) -> bool {
        self.draft == Draft::V7
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Looks up a document by its canonical name. `None` names the root.
    pub fn document(&self, name: Option<&str>) -> Option<&Value> {
        match name {
            None => Some(&self.root),
            Some(name) => self.documents.get(name),
        }
    }

    /// Resolves `reference`, written inside the fragment at `from`, to the
    /// schema it finally designates.
    pub fn resolve(
        &self,
        reference: &str,
        from: &SchemaPath,
    ) -> Result<Resolved<'_>, SchemaDefinitionError> {
        let mut stack: Vec<String> = Vec::new();
        let (mut fragment, mut location) = self.locate(reference, from)?;

        loop {
            let key = location.reference_key();
            trace!(target: "jsv", reference, key = %key, "resolving reference");

            if stack.contains(&key) {
                warn!(target: "jsv", key = %key, chain = ?stack, "rejecting cyclic reference");
                return Err(SchemaDefinitionError::new(
                    location,
                    SchemaErrorKind::CyclicReference(key),
                ));
            }
            stack.push(key.clone());

            match fragment.get("$ref").and_then(Value::as_str) {
                Some(next) => {
                    let ref_location = location.property("$ref");
                    let (next_fragment, next_location) = self.locate(next, &ref_location)?;
                    fragment = next_fragment;
                    location = next_location;
                }
                None => {
                    return Ok(Resolved {
                        fragment,
                        location,
                        key,
                    })
                }
            }
        }
    }

    /// Finds the fragment `reference` points at, without following any
    /// `$ref` it may hold.
    fn locate(
        &self,
        reference: &str,
        from: &SchemaPath,
    ) -> Result<(&Value, SchemaPath), SchemaDefinitionError> {
        let (document_part, pointer_part) = match reference.find('#') {
            Some(i) => (&reference[..i], &reference[i + 1..]),
            None => (reference, ""),
        };

        let document_name = if document_part.is_empty() {
            from.document.clone()
        } else {
            let name = self
                .aliases
                .get(document_part)
                .map(String::as_str)
                .unwrap_or(document_part);
            Some(name.to_owned())
        };

        let document = self.document(document_name.as_deref()).ok_or_else(|| {
            SchemaDefinitionError::new(
                from.clone(),
                SchemaErrorKind::UnknownDocument(document_part.to_owned()),
            )
        })?;

        let unresolvable = || {
            SchemaDefinitionError::new(
                from.clone(),
                SchemaErrorKind::UnresolvableReference(reference.to_owned()),
            )
        };

        let pointer =
            JsonPath::from_json_pointer(&percent_decode(pointer_part)).map_err(|_| unresolvable())?;

        let mut location = SchemaPath::root(document_name);
        let mut node = document;
        for token in pointer.steps() {
            let token = token.to_string();
            node = match node {
                Value::Object(map) => {
                    location = location.property(token.as_str());
                    map.get(&token)
                }
                Value::Array(items) => {
                    let index = token.parse::<usize>().map_err(|_| unresolvable())?;
                    location = location.index(index);
                    items.get(index)
                }
                _ => None,
            }
            .ok_or_else(unresolvable)?;
        }

        Ok((node, location))
    }
}

/// Decodes `%XX` escapes, which URI fragments use for characters such as
/// `%` and `"` inside JSON pointers.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(out).unwrap_or_else(|_| input.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver(root: Value) -> Resolver {
        Resolver::new(
            Draft::V7,
            root,
            vec![(
                "other.json".to_owned(),
                json!({
                    "$id": "http://example.com/other.json",
                    "definitions": {
                        "T": {"type": "string"},
                        "local": {"$ref": "#/definitions/T"},
                    },
                }),
            )],
        )
    }

    #[test]
    fn mode_queries() {
        let resolver = Resolver::new(Draft::V4, json!({}), vec![]);
        assert!(resolver.is_draft_v4_mode());
        assert!(!resolver.is_draft_v7_mode());
        assert!(!resolver.is_simple_mode());
        assert!(Resolver::new(Draft::Simple, json!({}), vec![]).is_simple_mode());
    }

    #[test]
    fn resolve_local_pointer() {
        let resolver = resolver(json!({"definitions": {"a": {"type": "integer"}}}));
        let resolved = resolver
            .resolve("#/definitions/a", &SchemaPath::root(None))
            .unwrap();

        assert_eq!(&json!({"type": "integer"}), resolved.fragment);
        assert_eq!("$.definitions.a", resolved.location.to_string());
        assert_eq!("#/definitions/a", resolved.key);
    }

    #[test]
    fn resolve_into_arrays() {
        let resolver = resolver(json!({"allOf": [{"type": "integer"}, {"minimum": 3}]}));
        let resolved = resolver.resolve("#/allOf/1", &SchemaPath::root(None)).unwrap();
        assert_eq!(&json!({"minimum": 3}), resolved.fragment);
        assert_eq!("$.allOf[1]", resolved.location.to_string());
    }

    #[test]
    fn resolve_other_document() {
        let resolver = resolver(json!({}));
        let resolved = resolver
            .resolve("other.json#/definitions/T", &SchemaPath::root(None))
            .unwrap();
        assert_eq!(&json!({"type": "string"}), resolved.fragment);
        assert_eq!(Some("other.json".to_owned()), resolved.location.document);

        // Local pointers inside the other document stay in that document.
        let resolved = resolver
            .resolve("other.json#/definitions/local", &SchemaPath::root(None))
            .unwrap();
        assert_eq!(&json!({"type": "string"}), resolved.fragment);
        assert_eq!("other.json#/definitions/T", resolved.key);
    }

    #[test]
    fn resolve_bare_and_aliased_documents() {
        let resolver = resolver(json!({}));
        let whole = resolver.resolve("other.json", &SchemaPath::root(None)).unwrap();
        assert!(whole.fragment.get("definitions").is_some());

        let aliased = resolver
            .resolve(
                "http://example.com/other.json#/definitions/T",
                &SchemaPath::root(None),
            )
            .unwrap();
        assert_eq!(&json!({"type": "string"}), aliased.fragment);
        assert_eq!(Some("other.json".to_owned()), aliased.location.document);
    }

    #[test]
    fn resolve_escaped_pointers() {
        let resolver = resolver(json!({"definitions": {"a/b": {"const": 1}, "c%d": {"const": 2}}}));
        let resolved = resolver
            .resolve("#/definitions/a~1b", &SchemaPath::root(None))
            .unwrap();
        assert_eq!(&json!({"const": 1}), resolved.fragment);

        let resolved = resolver
            .resolve("#/definitions/c%25d", &SchemaPath::root(None))
            .unwrap();
        assert_eq!(&json!({"const": 2}), resolved.fragment);
    }

    #[test]
    fn unresolvable_references() {
        let resolver = resolver(json!({"definitions": {}}));
        let from = SchemaPath::root(None).property("$ref");

        assert_eq!(
            SchemaDefinitionError::new(
                from.clone(),
                SchemaErrorKind::UnresolvableReference("#/definitions/missing".to_owned())
            ),
            resolver.resolve("#/definitions/missing", &from).unwrap_err()
        );
        assert_eq!(
            SchemaErrorKind::UnknownDocument("nope.json".to_owned()),
            resolver.resolve("nope.json#/a", &from).unwrap_err().kind
        );
    }

    #[test]
    fn cyclic_references() {
        let resolver = resolver(json!({
            "definitions": {
                "A": {"$ref": "#/definitions/B"},
                "B": {"$ref": "#/definitions/A"},
                "self": {"$ref": "#/definitions/self"},
            }
        }));

        let err = resolver
            .resolve("#/definitions/A", &SchemaPath::root(None))
            .unwrap_err();
        assert_eq!(
            SchemaErrorKind::CyclicReference("#/definitions/A".to_owned()),
            err.kind
        );

        assert!(matches!(
            resolver
                .resolve("#/definitions/self", &SchemaPath::root(None))
                .unwrap_err()
                .kind,
            SchemaErrorKind::CyclicReference(_)
        ));
    }

    #[test]
    fn diamond_references_are_not_cycles() {
        let resolver = resolver(json!({
            "definitions": {
                "left": {"$ref": "#/definitions/leaf"},
                "right": {"$ref": "#/definitions/leaf"},
                "leaf": {"type": "null"},
            }
        }));

        let left = resolver.resolve("#/definitions/left", &SchemaPath::root(None)).unwrap();
        let right = resolver.resolve("#/definitions/right", &SchemaPath::root(None)).unwrap();
        assert_eq!(left.key, right.key);
    }
}
