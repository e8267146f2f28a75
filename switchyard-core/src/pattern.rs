//! Path patterns with typed captures.
//!
//! A pattern is split on `/` into segments. Each segment is either literal
//! text or a whole-segment capture written `{name}` or `{name:type}`:
//!
//! ```
//! use switchyard_core::Pattern;
//!
//! let pattern = Pattern::compile("/add/{a:int}/{b:int}/").unwrap();
//! let params = pattern.matches("/add/3/4/").unwrap();
//! assert_eq!(params.int("a"), Some(3));
//! assert_eq!(params.int("b"), Some(4));
//! assert!(pattern.matches("/add/x/4/").is_none());
//! ```
//!
//! Supported types: `str` (the default), `int` (i64), `float` (f64) and
//! `uuid`. Matching is structural: segment counts must be equal, literals
//! must be equal, and every capture must coerce. There is no backtracking.

use crate::Error;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use uuid::Uuid;

static CAPTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([^{}:]*)(?::([^{}]*))?\}$").expect("valid capture regex"));

static IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Declared type of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Uuid,
}

impl ParamType {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "str" => Some(ParamType::Str),
            "int" => Some(ParamType::Int),
            "float" => Some(ParamType::Float),
            "uuid" => Some(ParamType::Uuid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Str => "str",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Uuid => "uuid",
        }
    }

    fn coerce(&self, raw: String) -> Option<ParamValue> {
        match self {
            ParamType::Str => Some(ParamValue::Str(raw)),
            ParamType::Int => raw.parse().ok().map(ParamValue::Int),
            ParamType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(ParamValue::Float),
            ParamType::Uuid => Uuid::try_parse(&raw).ok().map(ParamValue::Uuid),
        }
    }
}

/// A captured, coerced path parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Uuid(Uuid),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(value) => f.write_str(value),
            ParamValue::Int(value) => write!(f, "{value}"),
            ParamValue::Float(value) => write!(f, "{value}"),
            ParamValue::Uuid(value) => write!(f, "{value}"),
        }
    }
}

/// Named parameters extracted from one matched path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathParams {
    values: HashMap<String, ParamValue>,
}

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ParamValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ParamValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        match self.values.get(name) {
            Some(ParamValue::Float(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn uuid(&self, name: &str) -> Option<Uuid> {
        match self.values.get(name) {
            Some(ParamValue::Uuid(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture { name: String, ty: ParamType },
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    segments: Vec<Segment>,
}

impl Pattern {
    /// Compile a pattern string.
    ///
    /// Fails with [`Error::InvalidPattern`] when the pattern does not start
    /// with `/`, a capture name repeats or is not an identifier, a type tag is
    /// unknown, or a segment mixes literal text with braces.
    pub fn compile(pattern: &str) -> Result<Self, Error> {
        if !pattern.starts_with('/') {
            return Err(Error::invalid_pattern(pattern, "pattern must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut seen: Vec<&str> = Vec::new();

        for raw in pattern[1..].split('/') {
            if !raw.contains(['{', '}']) {
                segments.push(Segment::Literal(raw.to_string()));
                continue;
            }

            let caps = CAPTURE.captures(raw).ok_or_else(|| {
                Error::invalid_pattern(
                    pattern,
                    format!("segment {raw:?} must be a single {{name}} or {{name:type}} capture"),
                )
            })?;

            let name = caps.get(1).map_or("", |m| m.as_str());
            if !IDENT.is_match(name) {
                return Err(Error::invalid_pattern(
                    pattern,
                    format!("capture name {name:?} is not an identifier"),
                ));
            }
            if seen.contains(&name) {
                return Err(Error::invalid_pattern(
                    pattern,
                    format!("capture name {name:?} is used more than once"),
                ));
            }
            seen.push(name);

            let ty = match caps.get(2) {
                None => ParamType::Str,
                Some(tag) => ParamType::from_tag(tag.as_str()).ok_or_else(|| {
                    Error::invalid_pattern(
                        pattern,
                        format!("unknown type tag {:?} for capture {name:?}", tag.as_str()),
                    )
                })?,
            };

            segments.push(Segment::Capture {
                name: name.to_string(),
                ty,
            });
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern string this was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Capture names in declaration order
    pub fn capture_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Capture { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete path, returning the coerced captures on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let rest = path.strip_prefix('/')?;
        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Capture { name, ty } => {
                    let decoded = urlencoding::decode(part).ok()?.into_owned();
                    params.insert(name.clone(), ty.coerce(decoded)?);
                }
            }
        }
        Some(params)
    }

    /// True when every path matched by `other` is also matched by `self`,
    /// so registering `other` after `self` makes it unreachable.
    pub fn shadows(&self, other: &Pattern) -> bool {
        if self.segments.len() != other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(&other.segments)
            .all(|(outer, inner)| match (outer, inner) {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Literal(_), Segment::Capture { .. }) => false,
                (Segment::Capture { ty: ParamType::Str, .. }, _) => true,
                (Segment::Capture { ty, .. }, Segment::Literal(literal)) => urlencoding::decode(literal)
                    .ok()
                    .and_then(|decoded| ty.coerce(decoded.into_owned()))
                    .is_some(),
                (Segment::Capture { ty: outer_ty, .. }, Segment::Capture { ty: inner_ty, .. }) => {
                    outer_ty == inner_ty
                }
            })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<Pattern, Error>) -> String {
        match result {
            Err(Error::InvalidPattern { reason, .. }) => reason,
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_pattern() {
        let pattern = Pattern::compile("/text/").unwrap();
        assert!(pattern.matches("/text/").unwrap().is_empty());
        assert!(pattern.matches("/text").is_none());
        assert!(pattern.matches("/text/extra/").is_none());
        assert!(pattern.matches("/other/").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = Pattern::compile("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/a/").is_none());
    }

    #[test]
    fn test_untyped_capture_is_string() {
        let pattern = Pattern::compile("/hello/{name}/").unwrap();
        let params = pattern.matches("/hello/sample-name/").unwrap();
        assert_eq!(params.str("name"), Some("sample-name"));
        assert_eq!(params.get("name"), Some(&ParamValue::Str("sample-name".into())));
    }

    #[test]
    fn test_capture_is_percent_decoded() {
        let pattern = Pattern::compile("/hello/{name}/").unwrap();
        let params = pattern.matches("/hello/J%C3%BCrgen%20M/").unwrap();
        assert_eq!(params.str("name"), Some("Jürgen M"));
    }

    #[test]
    fn test_empty_segment_only_matches_str_capture() {
        let pattern = Pattern::compile("/hello/{name}/").unwrap();
        let params = pattern.matches("/hello//").unwrap();
        assert_eq!(params.str("name"), Some(""));
        let typed = Pattern::compile("/n/{id:int}/").unwrap();
        assert!(typed.matches("/n//").is_none());
    }

    #[test]
    fn test_int_captures() {
        let pattern = Pattern::compile("/add/{a:int}/{b:int}/").unwrap();
        let params = pattern.matches("/add/3/4/").unwrap();
        assert_eq!(params.int("a"), Some(3));
        assert_eq!(params.int("b"), Some(4));
        assert_eq!(params.str("a"), None);
        assert!(pattern.matches("/add/x/4/").is_none());
        assert!(pattern.matches("/add/-7/4/").is_some());
        assert!(pattern.matches("/add/99999999999999999999/4/").is_none());
    }

    #[test]
    fn test_float_and_uuid_captures() {
        let pattern = Pattern::compile("/scale/{factor:float}/{id:uuid}").unwrap();
        let params = pattern
            .matches("/scale/1.5/67e55044-10b1-426f-9247-bb680e5fe0c8")
            .unwrap();
        assert_eq!(params.float("factor"), Some(1.5));
        assert_eq!(
            params.uuid("id").map(|id| id.to_string()).as_deref(),
            Some("67e55044-10b1-426f-9247-bb680e5fe0c8")
        );
        assert!(pattern.matches("/scale/NaN/67e55044-10b1-426f-9247-bb680e5fe0c8").is_none());
        assert!(pattern.matches("/scale/1.5/not-a-uuid").is_none());
    }

    #[test]
    fn test_explicit_str_tag() {
        let pattern = Pattern::compile("/files/{name:str}/").unwrap();
        assert_eq!(pattern.matches("/files/42/").unwrap().str("name"), Some("42"));
    }

    #[test]
    fn test_duplicate_capture_name() {
        let msg = reason(Pattern::compile("/{a}/{a:int}/"));
        assert!(msg.contains("more than once"), "{msg}");
    }

    #[test]
    fn test_unknown_type_tag() {
        let msg = reason(Pattern::compile("/{a:date}/"));
        assert!(msg.contains("unknown type tag"), "{msg}");
    }

    #[test]
    fn test_malformed_segments() {
        reason(Pattern::compile("no-leading-slash/"));
        reason(Pattern::compile("/{}/"));
        reason(Pattern::compile("/{1abc}/"));
        reason(Pattern::compile("/prefix-{id}/"));
        reason(Pattern::compile("/{open/"));
        reason(Pattern::compile("/close}/"));
    }

    #[test]
    fn test_capture_names_in_order() {
        let pattern = Pattern::compile("/a/{x}/b/{y:int}/").unwrap();
        assert_eq!(pattern.capture_names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_shadowing() {
        let any = Pattern::compile("/items/{slug}/").unwrap();
        let numeric = Pattern::compile("/items/{id:int}/").unwrap();
        let literal = Pattern::compile("/items/new/").unwrap();
        let number_literal = Pattern::compile("/items/7/").unwrap();

        assert!(any.shadows(&numeric));
        assert!(any.shadows(&literal));
        assert!(!numeric.shadows(&any));
        assert!(!numeric.shadows(&literal));
        assert!(numeric.shadows(&number_literal));
        assert!(!literal.shadows(&any));
    }
}
