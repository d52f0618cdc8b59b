use crate::draft::Draft;
use crate::schema::SchemaSource;
use serde::Deserialize;

/// How a [`JsonSchema`][`crate::JsonSchema`] picks its dialect, and which
/// other documents its references may point into.
///
/// Everything but the dependencies can also be read from JSON:
///
/// ```
/// use jsv::{Draft, Options};
/// use serde_json::json;
///
/// let options: Options = serde_json::from_value(json!({
///     "defaultDraft": "draft-04",
///     "simple": false,
/// }))
/// .unwrap();
///
/// assert_eq!(Draft::V4, options.default_draft());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Options {
    draft: Option<Draft>,
    default_draft: Draft,
    simple: bool,

    #[serde(skip)]
    dependencies: Vec<(String, SchemaSource)>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `draft` whatever the schema's `$schema` says.
    pub fn with_draft(mut self, draft: Draft) -> Self {
        self.draft = Some(draft);
        self
    }

    /// Uses `draft` when the schema has no `$schema`, or one this crate
    /// does not recognise.
    pub fn with_default_draft(mut self, draft: Draft) -> Self {
        self.default_draft = draft;
        self
    }

    /// Forces the strict simple dialect. Takes precedence over any draft.
    pub fn with_simple_mode(mut self, simple: bool) -> Self {
        self.simple = simple;
        self
    }

    /// Registers a document that references can name as `id` or
    /// `id#/json/pointer`.
    pub fn with_dependency(mut self, id: impl Into<String>, source: impl Into<SchemaSource>) -> Self {
        self.dependencies.push((id.into(), source.into()));
        self
    }

    pub fn draft(&self) -> Option<Draft> {
        self.draft
    }

    pub fn default_draft(&self) -> Draft {
        self.default_draft
    }

    pub fn simple_mode(&self) -> bool {
        self.simple
    }

    pub(crate) fn into_dependencies(self) -> Vec<(String, SchemaSource)> {
        self.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder() {
        let options = Options::new()
            .with_draft(Draft::V6)
            .with_simple_mode(true)
            .with_dependency("other.json", json!({"type": "string"}));

        assert_eq!(Some(Draft::V6), options.draft());
        assert_eq!(Draft::V7, options.default_draft());
        assert!(options.simple_mode());
        assert_eq!(1, options.into_dependencies().len());
    }

    #[test]
    fn from_json() {
        assert_eq!(
            Options::new().with_draft(Draft::V3).with_simple_mode(true),
            serde_json::from_value(json!({"draft": "draft-03", "simple": true})).unwrap()
        );
        assert_eq!(Options::new(), serde_json::from_value(json!({})).unwrap());
        assert!(serde_json::from_value::<Options>(json!({"dependencies": []})).is_err());
        assert!(serde_json::from_value::<Options>(json!({"draft": "draft-05"})).is_err());
    }
}
