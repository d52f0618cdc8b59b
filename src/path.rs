//! Locations inside a schema document or a JSON instance.
//!
//! A [`JsonPath`] is a root-relative list of [`Step`]s. It renders in three
//! forms, all of which parse back with [`str::parse`]:
//!
//! | form     | example           |
//! |----------|-------------------|
//! | dot      | `$.a.b[3]`        |
//! | bracket  | `$['a']['b'][3]`  |
//! | pointer  | `$/a/b[3]`        |
//!
//! JSON Pointer (`#/a/b`) is supported too, but only for paths made of
//! property steps: a pointer cannot tell the index `3` from the property
//! `"3"`, so [`JsonPath::to_json_pointer`] refuses to render index steps.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum Step {
    Property(String),
    Index(usize),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Step::Property(name) => f.write_str(name),
            Step::Index(index) => write!(f, "{}", index),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("path `{path}` is malformed at offset {offset}")]
    Malformed { path: String, offset: usize },

    #[error("path `{path}` has an array index, which a JSON pointer cannot express")]
    IndexInJsonPointer { path: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct JsonPath {
    steps: Vec<Step>,
}

/// A location inside the instance being validated.
pub type DataPath = JsonPath;

impl JsonPath {
    /// The root path, `$`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn add_property_key(&mut self, name: impl Into<String>) {
        self.steps.push(Step::Property(name.into()));
    }

    pub fn add_array_index(&mut self, index: usize) {
        self.steps.push(Step::Index(index));
    }

    pub fn remove_last_element(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    /// A copy of this path extended by one property step.
    pub fn property(&self, name: impl Into<String>) -> Self {
        let mut out = self.clone();
        out.add_property_key(name);
        out
    }

    /// A copy of this path extended by one index step.
    pub fn index(&self, index: usize) -> Self {
        let mut out = self.clone();
        out.add_array_index(index);
        out
    }

    pub fn to_dot(&self) -> String {
        let mut out = String::from("$");
        for step in &self.steps {
            match step {
                Step::Property(name) if is_plain_name(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                Step::Property(name) => push_quoted(&mut out, name),
                Step::Index(index) => out.push_str(&format!("[{}]", index)),
            }
        }

        out
    }

    pub fn to_bracket(&self) -> String {
        let mut out = String::from("$");
        for step in &self.steps {
            match step {
                Step::Property(name) => push_quoted(&mut out, name),
                Step::Index(index) => out.push_str(&format!("[{}]", index)),
            }
        }

        out
    }

    pub fn to_pointer(&self) -> String {
        let mut out = String::from("$");
        for step in &self.steps {
            match step {
                // `[` would start an index segment when read back.
                Step::Property(name) if name.contains('[') => push_quoted(&mut out, name),
                Step::Property(name) => {
                    out.push('/');
                    out.push_str(&escape_pointer_token(name));
                }
                Step::Index(index) => out.push_str(&format!("[{}]", index)),
            }
        }

        out
    }

    pub fn to_json_pointer(&self) -> Result<String, PathError> {
        let mut out = String::from("#");
        for step in &self.steps {
            match step {
                Step::Property(name) => {
                    out.push('/');
                    out.push_str(&escape_pointer_token(name));
                }
                Step::Index(_) => {
                    return Err(PathError::IndexInJsonPointer {
                        path: self.to_pointer(),
                    })
                }
            }
        }

        Ok(out)
    }

    /// Parses the part of a JSON pointer after the `#`, such as `/a/b`.
    /// Every token becomes a property step.
    pub fn from_json_pointer(pointer: &str) -> Result<Self, PathError> {
        if pointer.is_empty() {
            return Ok(Self::root());
        }

        if !pointer.starts_with('/') {
            return Err(malformed(pointer, 0));
        }

        let steps = pointer[1..]
            .split('/')
            .map(|token| Step::Property(unescape_pointer_token(token)))
            .collect();

        Ok(Self { steps })
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_dot())
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(pointer) = s.strip_prefix('#') {
            return Self::from_json_pointer(pointer);
        }

        if s.starts_with('$') {
            // Bracket segments are shared by both forms, so the first `.` or
            // `/` after them decides how the rest is read.
            let mut parser = Parser::new(s, 1);
            let mut path = parser.brackets()?;
            let rest = if parser.peek() == Some('/') {
                parser.pointer()?
            } else {
                parser.dotted()?
            };

            path.steps.extend(rest.steps);
            return Ok(path);
        }

        // A relative dot path such as `a.b[0]`.
        if s.is_empty() {
            return Ok(Self::root());
        }

        if s.starts_with('[') {
            return Parser::new(s, 0).dotted();
        }

        let mut parser = Parser::new(s, 0);
        let first = parser.name();
        if first.is_empty() {
            return Err(malformed(s, 0));
        }

        let mut path = parser.dotted()?;
        path.steps.insert(0, Step::Property(first));
        Ok(path)
    }
}

/// A location inside a schema document, optionally naming the document it
/// belongs to. Paths into the root schema carry no document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath {
    pub document: Option<String>,
    pub path: JsonPath,
}

impl SchemaPath {
    pub fn root(document: Option<String>) -> Self {
        Self {
            document,
            path: JsonPath::root(),
        }
    }

    pub fn property(&self, name: impl Into<String>) -> Self {
        Self {
            document: self.document.clone(),
            path: self.path.property(name),
        }
    }

    pub fn index(&self, index: usize) -> Self {
        Self {
            document: self.document.clone(),
            path: self.path.index(index),
        }
    }

    /// The location of keyword `name` beside the keyword at this location.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.remove_last_element();
        path.add_property_key(name);
        Self {
            document: self.document.clone(),
            path,
        }
    }

    /// The `document#/json/pointer` identity of this location, used to
    /// recognise a reference that is already being expanded.
    pub fn reference_key(&self) -> String {
        let mut out = self.document.clone().unwrap_or_default();
        out.push('#');
        for step in self.path.steps() {
            out.push('/');
            out.push_str(&escape_pointer_token(&step.to_string()));
        }
        out
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.document {
            Some(document) => write!(f, "[{}]{}", document, self.path),
            None => write!(f, "{}", self.path),
        }
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c| matches!(c, '.' | '[' | ']' | '\'' | '\\' | '/'))
}

fn push_quoted(out: &mut String, name: &str) {
    out.push_str("['");
    for c in name.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push_str("']");
}

fn escape_pointer_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn unescape_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

fn malformed(path: &str, offset: usize) -> PathError {
    PathError::Malformed {
        path: path.to_owned(),
        offset,
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, pos: usize) -> Self {
        Self { input, pos }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> Result<(), PathError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            _ => Err(malformed(self.input, self.pos)),
        }
    }

    /// Reads an unquoted name up to the next separator.
    fn name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | '[' | '/') {
                break;
            }
            self.bump();
        }

        self.input[start..self.pos].to_owned()
    }

    /// Parses a sequence of `.name`, `['name']` and `[3]` segments.
    fn dotted(&mut self) -> Result<JsonPath, PathError> {
        let mut path = JsonPath::root();
        while let Some(c) = self.peek() {
            match c {
                '.' => {
                    self.bump();
                    let name = self.name();
                    if name.is_empty() {
                        return Err(malformed(self.input, self.pos));
                    }
                    path.add_property_key(name);
                }
                '[' => path.steps.push(self.bracket()?),
                _ => return Err(malformed(self.input, self.pos)),
            }
        }

        Ok(path)
    }

    /// Parses a run of `['name']` and `[3]` segments.
    fn brackets(&mut self) -> Result<JsonPath, PathError> {
        let mut path = JsonPath::root();
        while self.peek() == Some('[') {
            path.steps.push(self.bracket()?);
        }

        Ok(path)
    }

    /// Parses a sequence of `/token`, `['name']` and `[3]` segments.
    fn pointer(&mut self) -> Result<JsonPath, PathError> {
        let mut path = JsonPath::root();
        while let Some(c) = self.peek() {
            match c {
                '/' => {
                    self.bump();
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == '/' || c == '[' {
                            break;
                        }
                        self.bump();
                    }
                    path.add_property_key(unescape_pointer_token(&self.input[start..self.pos]));
                }
                '[' => path.steps.push(self.bracket()?),
                _ => return Err(malformed(self.input, self.pos)),
            }
        }

        Ok(path)
    }

    fn bracket(&mut self) -> Result<Step, PathError> {
        self.eat('[')?;
        if self.peek() == Some('\'') {
            self.bump();
            let mut name = String::new();
            loop {
                match self.bump() {
                    Some('\\') => match self.bump() {
                        Some(c) => name.push(c),
                        None => return Err(malformed(self.input, self.pos)),
                    },
                    Some('\'') => break,
                    Some(c) => name.push(c),
                    None => return Err(malformed(self.input, self.pos)),
                }
            }
            self.eat(']')?;
            return Ok(Step::Property(name));
        }

        let start = self.pos;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.bump();
        }

        let index = self.input[start..self.pos]
            .parse()
            .map_err(|_| malformed(self.input, start))?;
        self.eat(']')?;
        Ok(Step::Index(index))
    }
}
