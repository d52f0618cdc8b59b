use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The dialect a schema is written in.
///
/// `Simple` is a strict dialect built on the draft 4 keyword set: it knows no
/// keyword outside that set, rejects unknown `format` names, and never treats
/// a float such as `3.0` as an integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Draft {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "draft-03")]
    V3,
    #[serde(rename = "draft-04")]
    V4,
    #[serde(rename = "draft-06")]
    V6,
    #[serde(rename = "draft-07")]
    V7,
}

impl Default for Draft {
    fn default() -> Self {
        Draft::V7
    }
}

impl Draft {
    /// Detects the dialect named by a `$schema` URI, such as
    /// `http://json-schema.org/draft-04/schema#`.
    pub fn from_uri(uri: &str) -> Option<Self> {
        if uri.contains("draft-03") {
            Some(Draft::V3)
        } else if uri.contains("draft-04") {
            Some(Draft::V4)
        } else if uri.contains("draft-06") {
            Some(Draft::V6)
        } else if uri.contains("draft-07") {
            Some(Draft::V7)
        } else {
            None
        }
    }

    /// Detects the dialect from the `$schema` keyword of a schema document.
    pub fn detect(schema: &Value) -> Option<Self> {
        schema
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_uri)
    }

    /// The keyword holding a document's own identifier.
    pub fn id_keyword(self) -> &'static str {
        match self {
            Draft::Simple | Draft::V3 | Draft::V4 => "id",
            Draft::V6 | Draft::V7 => "$id",
        }
    }

    /// Draft 6 introduced `true` and `false` as schemas, along with `const`,
    /// `contains`, `propertyNames` and numeric exclusive bounds.
    pub fn is_v6_or_later(self) -> bool {
        matches!(self, Draft::V6 | Draft::V7)
    }

    /// Whether a float without a fractional part satisfies `"integer"`.
    pub fn relaxes_integers(self) -> bool {
        self.is_v6_or_later()
    }
}

impl fmt::Display for Draft {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Draft::Simple => "simple",
            Draft::V3 => "draft-03",
            Draft::V4 => "draft-04",
            Draft::V6 => "draft-06",
            Draft::V7 => "draft-07",
        })
    }
}

impl FromStr for Draft {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Draft::Simple),
            "draft-03" | "draft3" | "v3" => Ok(Draft::V3),
            "draft-04" | "draft4" | "v4" => Ok(Draft::V4),
            "draft-06" | "draft6" | "v6" => Ok(Draft::V6),
            "draft-07" | "draft7" | "v7" => Ok(Draft::V7),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_from_str() {
        assert_eq!(Err(()), "Draft-04".parse::<Draft>());
        assert_eq!(Ok(Draft::Simple), "simple".parse());
        assert_eq!(Ok(Draft::V3), "draft-03".parse());
        assert_eq!(Ok(Draft::V4), "draft4".parse());
        assert_eq!(Ok(Draft::V6), "v6".parse());
        assert_eq!(Ok(Draft::V7), "draft-07".parse());
    }

    #[test]
    fn detect_from_schema_keyword() {
        assert_eq!(
            Some(Draft::V4),
            Draft::detect(&json!({"$schema": "http://json-schema.org/draft-04/schema#"}))
        );
        assert_eq!(
            Some(Draft::V3),
            Draft::detect(&json!({"$schema": "http://json-schema.org/draft-03/schema#"}))
        );
        assert_eq!(None, Draft::detect(&json!({"$schema": "https://example.com/x"})));
        assert_eq!(None, Draft::detect(&json!({})));
        assert_eq!(None, Draft::detect(&json!(true)));
    }

    #[test]
    fn serde_names() {
        assert_eq!(json!("draft-06"), serde_json::to_value(Draft::V6).unwrap());
        assert_eq!(Draft::Simple, serde_json::from_value::<Draft>(json!("simple")).unwrap());
        assert_eq!("draft-07", Draft::V7.to_string());
    }
}
