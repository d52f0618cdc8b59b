use crate::draft::Draft;
use crate::error::{DataErrorKind, SchemaDefinitionError, SchemaErrorKind, ValidateError};
use crate::path::SchemaPath;
use crate::validate::Vm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde_json::Value;
use std::net::{Ipv4Addr, Ipv6Addr};
use url::Url;

use super::invalid_value;

const COLORS: &[&str] = &[
    "aqua", "black", "blue", "fuchsia", "gray", "green", "lime", "maroon", "navy", "olive",
    "orange", "purple", "red", "silver", "teal", "white", "yellow",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    DateTime,
    Date,
    Time,
    Email,
    Hostname,
    Ipv4,
    Ipv6,
    Uri,
    UriReference,
    Regex,
    Base64,
    Color,
    JsonPointer,
}

impl Kind {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "date-time" => Kind::DateTime,
            "date" => Kind::Date,
            "time" => Kind::Time,
            "email" => Kind::Email,
            "hostname" | "host-name" => Kind::Hostname,
            "ipv4" | "ip-address" => Kind::Ipv4,
            "ipv6" => Kind::Ipv6,
            "uri" => Kind::Uri,
            "uri-reference" => Kind::UriReference,
            "regex" => Kind::Regex,
            "base64" => Kind::Base64,
            "color" => Kind::Color,
            "json-pointer" => Kind::JsonPointer,
            _ => return None,
        })
    }
}

/// `format`, for the names this crate knows how to check.
#[derive(Debug)]
pub(crate) struct Format {
    name: String,
    kind: Kind,
    draft: Draft,
}

impl Format {
    /// Unknown format names are annotations, except in the simple dialect
    /// where they are errors.
    pub fn compile(
        value: &Value,
        path: &SchemaPath,
        draft: Draft,
    ) -> Result<Option<Self>, SchemaDefinitionError> {
        let name = value
            .as_str()
            .ok_or_else(|| invalid_value(path, "format", "a string"))?;

        match Kind::from_name(name) {
            Some(kind) => Ok(Some(Self {
                name: name.to_owned(),
                kind,
                draft,
            })),
            None if draft == Draft::Simple => Err(SchemaDefinitionError::new(
                path.clone(),
                SchemaErrorKind::UnknownFormat(name.to_owned()),
            )),
            None => Ok(None),
        }
    }

    pub fn validate(&self, vm: &mut Vm, instance: &Value) -> Result<(), ValidateError> {
        match instance {
            Value::String(s) if !self.check(s) => vm.fail(DataErrorKind::Format {
                format: self.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn check(&self, s: &str) -> bool {
        match self.kind {
            Kind::DateTime => DateTime::parse_from_rfc3339(s).is_ok(),
            Kind::Date => is_date(s),
            Kind::Time if self.draft == Draft::V3 => {
                s.len() == 8 && NaiveTime::parse_from_str(s, "%H:%M:%S").is_ok()
            }
            Kind::Time => is_full_time(s),
            Kind::Email => is_email(s),
            Kind::Hostname => is_hostname(s),
            Kind::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            Kind::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            Kind::Uri => !has_space(s) && Url::parse(s).is_ok(),
            Kind::UriReference => is_uri_reference(s),
            Kind::Regex => Regex::new(s).is_ok(),
            Kind::Base64 => STANDARD.decode(s).is_ok(),
            Kind::Color => is_color(s),
            Kind::JsonPointer => is_json_pointer(s),
        }
    }
}

fn has_space(s: &str) -> bool {
    s.chars().any(char::is_whitespace)
}

// chrono tolerates single-digit fields, so the shape is checked first.
fn is_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

// RFC 3339 full-time, e.g. `12:30:00Z` or `12:30:00.5+01:00`.
fn is_full_time(s: &str) -> bool {
    s.len() >= 9 && DateTime::parse_from_rfc3339(&format!("1970-01-01T{}", s)).is_ok()
}

fn is_email(s: &str) -> bool {
    let mut parts = s.rsplitn(2, '@');
    let (domain, local) = match (parts.next(), parts.next()) {
        (Some(domain), Some(local)) => (domain, local),
        _ => return false,
    };

    !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~.".contains(c))
        && is_hostname(domain)
}

fn is_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    !s.is_empty()
        && s.len() <= 253
        && s.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

fn is_uri_reference(s: &str) -> bool {
    if has_space(s) {
        return false;
    }

    match Url::parse(s) {
        Ok(_) => true,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://example.invalid/")
            .and_then(|base| base.join(s))
            .is_ok(),
        Err(_) => false,
    }
}

fn is_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => COLORS.contains(&s.to_ascii_lowercase().as_str()),
    }
}

fn is_json_pointer(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }

    if !s.starts_with('/') {
        return false;
    }

    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return false;
        }
    }

    true
}
