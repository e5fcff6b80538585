//! Route path patterns.
//!
//! Modules declare paths either with angle placeholders (`/chat/room/<int:room_id>`)
//! or with brace placeholders (`/chat/room/{room_id}`, `/static/{*path}`). Both parse
//! into the same [`RoutePattern`], whose canonical form is the brace syntax understood
//! by the HTTP host.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};

/// Value converter attached to a path placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Converter {
    /// Any non-empty value without `/`.
    String,
    /// Signed integer.
    Int,
    /// Remainder of the path, `/` allowed.
    Path,
}

impl Converter {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "int" => Some(Self::Int),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    fn accepts(self, value: &str) -> bool {
        match self {
            Self::String => !value.is_empty() && !value.contains('/'),
            Self::Int => value.parse::<i64>().is_ok(),
            Self::Path => !value.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Part {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// A parsed route path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    parts: Vec<Part>,
}

/// Reason a path pattern was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("path must start with '/'")]
    MissingLeadingSlash,
    #[error("unclosed placeholder starting at byte {0}")]
    UnclosedPlaceholder(usize),
    #[error("empty placeholder name")]
    EmptyName,
    #[error("invalid placeholder name '{0}'")]
    InvalidName(String),
    #[error("unknown converter '{0}'")]
    UnknownConverter(String),
    #[error("placeholder '{0}' appears more than once")]
    DuplicateName(String),
    #[error("placeholder '{0}' must end its path segment")]
    PlaceholderNotAtSegmentEnd(String),
    #[error("catch-all placeholder '{0}' must end the path")]
    CatchAllNotLast(String),
    #[error("unexpected '{0}' outside a placeholder")]
    StrayDelimiter(char),
    #[error("path segment '{0}' starts with a reserved character")]
    ReservedSegment(String),
}

impl RoutePattern {
    /// Parse a path declared by a module.
    ///
    /// # Errors
    /// Returns `PatternError` when the path does not start with `/`, a placeholder is
    /// unclosed or malformed, a placeholder name repeats, a placeholder shares its
    /// segment with trailing text, a catch-all is not last, or a literal carries
    /// `}`, `>` or a segment starting with `:` or `*`.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut seen = BTreeSet::new();
        let mut rest = raw;
        let mut offset = 0;

        while let Some(pos) = rest.find(['<', '{']) {
            literal.push_str(&rest[..pos]);
            let close = if rest[pos..].starts_with('<') { '>' } else { '}' };
            let Some(len) = rest[pos + 1..].find(close) else {
                return Err(PatternError::UnclosedPlaceholder(offset + pos));
            };
            let body = &rest[pos + 1..pos + 1 + len];
            let (name, converter) = if close == '>' {
                parse_angle(body)?
            } else {
                parse_brace(body)
            };
            validate_name(name)?;
            if !seen.insert(name.to_owned()) {
                return Err(PatternError::DuplicateName(name.to_owned()));
            }

            if !literal.is_empty() {
                validate_literal(&literal)?;
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            parts.push(Part::Param {
                name: name.to_owned(),
                converter,
            });

            let consumed = pos + len + 2;
            offset += consumed;
            rest = &rest[consumed..];

            if converter == Converter::Path && !rest.is_empty() {
                return Err(PatternError::CatchAllNotLast(name.to_owned()));
            }
            if !rest.is_empty() && !rest.starts_with('/') {
                return Err(PatternError::PlaceholderNotAtSegmentEnd(name.to_owned()));
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            validate_literal(&literal)?;
            parts.push(Part::Literal(literal));
        }

        Ok(Self { parts })
    }

    /// Canonical brace form, e.g. `/chat/room/{room_id}`.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.render(|name, converter| match converter {
            Converter::Path => format!("{{*{name}}}"),
            Converter::String | Converter::Int => format!("{{{name}}}"),
        })
    }

    /// Placeholder-name-independent form used as the collision key:
    /// `/a/<int:id>`, `/a/{id}` and `/a/{other}` dispatch identically.
    #[must_use]
    pub fn shape(&self) -> String {
        self.render(|_, converter| match converter {
            Converter::Path => "{*}".to_owned(),
            Converter::String | Converter::Int => "{}".to_owned(),
        })
    }

    /// Whether both patterns reach the same position through the same literals and one
    /// holds a segment placeholder there while the other holds a catch-all.
    ///
    /// Such routes cannot share a router whatever their methods: `/f/{id}` and
    /// `/f/{*rest}` both claim `/f/x`.
    #[must_use]
    pub fn catch_all_conflicts_with(&self, other: &Self) -> bool {
        for pair in self.parts.iter().zip(&other.parts) {
            match pair {
                (Part::Literal(a), Part::Literal(b)) if a == b => {}
                (Part::Param { converter: a, .. }, Part::Param { converter: b, .. }) => {
                    if (*a == Converter::Path) != (*b == Converter::Path) {
                        return true;
                    }
                }
                _ => return false,
            }
        }
        false
    }

    /// Names of the placeholders, in path order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|p| match p {
            Part::Param { name, .. } => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    #[must_use]
    pub fn has_params(&self) -> bool {
        self.param_names().next().is_some()
    }

    /// Build a concrete URL.
    ///
    /// Placeholder values are percent-encoded (`path` placeholders keep their `/`);
    /// values not consumed by a placeholder become a query string sorted by key.
    /// Returns `None` when a placeholder has no value or its converter rejects it.
    #[must_use]
    pub fn build(&self, params: &BTreeMap<String, String>) -> Option<String> {
        let mut url = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => url.push_str(text),
                Part::Param { name, converter } => {
                    let value = params.get(name)?;
                    if !converter.accepts(value) {
                        return None;
                    }
                    if *converter == Converter::Path {
                        let encoded: Vec<_> =
                            value.split('/').map(urlencoding::encode).collect();
                        url.push_str(&encoded.join("/"));
                    } else {
                        url.push_str(&urlencoding::encode(value));
                    }
                }
            }
        }

        let used: BTreeSet<&str> = self.param_names().collect();
        let query: Vec<String> = params
            .iter()
            .filter(|(key, _)| !used.contains(key.as_str()))
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        Some(url)
    }

    fn render(&self, placeholder: impl Fn(&str, Converter) -> String) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Param { name, converter } => out.push_str(&placeholder(name, *converter)),
            }
        }
        out
    }
}

fn parse_angle(body: &str) -> Result<(&str, Converter), PatternError> {
    match body.split_once(':') {
        Some((conv, name)) => {
            let converter = Converter::parse(conv.trim())
                .ok_or_else(|| PatternError::UnknownConverter(conv.trim().to_owned()))?;
            Ok((name.trim(), converter))
        }
        None => Ok((body.trim(), Converter::String)),
    }
}

fn parse_brace(body: &str) -> (&str, Converter) {
    match body.strip_prefix('*') {
        Some(name) => (name.trim(), Converter::Path),
        None => (body.trim(), Converter::String),
    }
}

fn validate_literal(text: &str) -> Result<(), PatternError> {
    if let Some(c) = text.chars().find(|c| matches!(c, '}' | '>')) {
        return Err(PatternError::StrayDelimiter(c));
    }
    match text
        .split('/')
        .find(|segment| segment.starts_with([':', '*']))
    {
        Some(segment) => Err(PatternError::ReservedSegment(segment.to_owned())),
        None => Ok(()),
    }
}

fn validate_name(name: &str) -> Result<(), PatternError> {
    if name.is_empty() {
        return Err(PatternError::EmptyName);
    }
    let valid = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(PatternError::InvalidName(name.to_owned()))
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl Serialize for RoutePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn angle_and_brace_syntax_share_canonical_form() {
        let angle = RoutePattern::parse("/chat/room/<int:room_id>").unwrap();
        let brace = RoutePattern::parse("/chat/room/{room_id}").unwrap();
        assert_eq!(angle.canonical(), "/chat/room/{room_id}");
        assert_eq!(brace.canonical(), "/chat/room/{room_id}");
        assert_eq!(angle.shape(), brace.shape());
        assert_eq!(
            RoutePattern::parse("/static/<path:file>").unwrap().canonical(),
            "/static/{*file}"
        );
    }

    #[test]
    fn shape_ignores_placeholder_names() {
        let a = RoutePattern::parse("/blog/post/<int:post_id>").unwrap();
        let b = RoutePattern::parse("/blog/post/{id}").unwrap();
        assert_ne!(a.canonical(), b.canonical());
        assert_eq!(a.shape(), "/blog/post/{}");
        assert_eq!(a.shape(), b.shape());
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert_eq!(
            RoutePattern::parse("chat"),
            Err(PatternError::MissingLeadingSlash)
        );
        assert_eq!(
            RoutePattern::parse("/chat/<room"),
            Err(PatternError::UnclosedPlaceholder(6))
        );
        assert_eq!(
            RoutePattern::parse("/x/<float:v>"),
            Err(PatternError::UnknownConverter("float".to_owned()))
        );
        assert_eq!(RoutePattern::parse("/x/{}"), Err(PatternError::EmptyName));
        assert_eq!(
            RoutePattern::parse("/x/<a>/<a>"),
            Err(PatternError::DuplicateName("a".to_owned()))
        );
        assert!(matches!(
            RoutePattern::parse("/x/{a-b}"),
            Err(PatternError::InvalidName(_))
        ));
    }

    #[test]
    fn rejects_paths_the_http_host_cannot_mount() {
        assert_eq!(
            RoutePattern::parse("/u/:id"),
            Err(PatternError::ReservedSegment(":id".to_owned()))
        );
        assert_eq!(
            RoutePattern::parse("/files/*rest"),
            Err(PatternError::ReservedSegment("*rest".to_owned()))
        );
        assert_eq!(
            RoutePattern::parse("/a}/b"),
            Err(PatternError::StrayDelimiter('}'))
        );
        assert_eq!(
            RoutePattern::parse("/a/b>"),
            Err(PatternError::StrayDelimiter('>'))
        );
        assert_eq!(
            RoutePattern::parse("/img/<name>.png"),
            Err(PatternError::PlaceholderNotAtSegmentEnd("name".to_owned()))
        );
        assert_eq!(
            RoutePattern::parse("/x/<a><b>"),
            Err(PatternError::PlaceholderNotAtSegmentEnd("a".to_owned()))
        );
        assert_eq!(
            RoutePattern::parse("/static/{*file}/raw"),
            Err(PatternError::CatchAllNotLast("file".to_owned()))
        );
        assert!(RoutePattern::parse("/user_<name>/posts").is_ok());
        assert!(RoutePattern::parse("/time/12:30").is_ok());
    }

    #[test]
    fn segment_placeholder_and_catch_all_at_same_position_conflict() {
        let param = RoutePattern::parse("/f/<id>").unwrap();
        let catch_all = RoutePattern::parse("/f/<path:rest>").unwrap();
        assert_ne!(param.shape(), catch_all.shape());
        assert!(param.catch_all_conflicts_with(&catch_all));
        assert!(catch_all.catch_all_conflicts_with(&param));

        let deeper = RoutePattern::parse("/f/<id>/edit").unwrap();
        assert!(catch_all.catch_all_conflicts_with(&deeper));

        let other_prefix = RoutePattern::parse("/g/<path:rest>").unwrap();
        assert!(!param.catch_all_conflicts_with(&other_prefix));
        let literal = RoutePattern::parse("/f/about").unwrap();
        assert!(!catch_all.catch_all_conflicts_with(&literal));
        let renamed = RoutePattern::parse("/f/{other}").unwrap();
        assert!(!param.catch_all_conflicts_with(&renamed));
    }

    #[test]
    fn builds_urls_with_params_and_query() {
        let pattern = RoutePattern::parse("/blog/category/<category_name>").unwrap();
        assert_eq!(
            pattern.build(&params(&[("category_name", "rust lang")])),
            Some("/blog/category/rust%20lang".to_owned())
        );
        assert_eq!(
            pattern.build(&params(&[("category_name", "news"), ("page", "2"), ("by", "me")])),
            Some("/blog/category/news?by=me&page=2".to_owned())
        );
        assert_eq!(pattern.build(&BTreeMap::new()), None);
    }

    #[test]
    fn int_converter_rejects_non_numbers() {
        let pattern = RoutePattern::parse("/chat/room/<int:room_id>").unwrap();
        assert_eq!(
            pattern.build(&params(&[("room_id", "42")])),
            Some("/chat/room/42".to_owned())
        );
        assert_eq!(pattern.build(&params(&[("room_id", "general")])), None);
    }

    #[test]
    fn path_converter_keeps_slashes() {
        let pattern = RoutePattern::parse("/static/{*file}").unwrap();
        assert_eq!(
            pattern.build(&params(&[("file", "css/dark modern.css")])),
            Some("/static/css/dark%20modern.css".to_owned())
        );
    }

    #[test]
    fn static_pattern_has_no_params() {
        let pattern = RoutePattern::parse("/chat").unwrap();
        assert!(!pattern.has_params());
        assert_eq!(pattern.build(&BTreeMap::new()), Some("/chat".to_owned()));
        assert_eq!(pattern.to_string(), "/chat");
    }
}
