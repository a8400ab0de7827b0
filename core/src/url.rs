//! URL Matching Collaborator
//!
//! The state tree only needs three things from a URL pattern: the parameter
//! names it declares, a way to format it back into a URL, and a way to append a
//! relative pattern. [`UrlMatcherFactory`] is the seam; [`PathMatcherFactory`]
//! is a small default implementation.
//!
//! Supported pattern syntax:
//! - `:name` and `{name}` placeholders, each matching up to the next `/`
//! - a trailing `?a&b` section declaring query parameters
//!
//! Values are percent-encoded by `format` and decoded by `exec`, so a value
//! containing `/`, `?`, `&` or `#` stays inside its own placeholder.

use crate::params::Params;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatcherError {
    #[error("unterminated placeholder in pattern '{0}'")]
    UnterminatedPlaceholder(String),

    #[error("empty parameter name in pattern '{0}'")]
    EmptyParameter(String),

    #[error("invalid parameter name '{name}' in pattern '{pattern}'")]
    InvalidParameter { pattern: String, name: String },

    #[error("duplicate parameter '{name}' in pattern '{pattern}'")]
    DuplicateParameter { pattern: String, name: String },
}

/// A compiled URL pattern.
pub trait UrlMatcher: Send + Sync + fmt::Debug {
    /// The pattern this matcher was compiled from.
    fn source(&self) -> &str;

    /// Declared parameter names, path parameters first.
    fn parameters(&self) -> &[String];

    /// Match a URL, returning every declared parameter (unmatched query
    /// parameters as `None`).
    fn exec(&self, url: &str) -> Option<Params>;

    /// Format a URL from parameter values.
    fn format(&self, params: &Params) -> String;

    /// Compile `self` followed by a relative pattern.
    fn concat(&self, pattern: &str) -> Result<Arc<dyn UrlMatcher>, MatcherError>;
}

/// Compiles URL patterns into matchers.
pub trait UrlMatcherFactory: Send + Sync {
    fn compile(&self, pattern: &str) -> Result<Arc<dyn UrlMatcher>, MatcherError>;
}

/// Default factory producing [`PathMatcher`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMatcherFactory;

impl UrlMatcherFactory for PathMatcherFactory {
    fn compile(&self, pattern: &str) -> Result<Arc<dyn UrlMatcher>, MatcherError> {
        Ok(Arc::new(PathMatcher::compile(pattern)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Path pattern matcher with `:name` / `{name}` placeholders.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    source: String,
    segments: Vec<Segment>,
    query: Vec<String>,
    parameters: Vec<String>,
}

/// Everything except RFC 3986 unreserved characters.
const VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, VALUE).to_string()
}

fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl PathMatcher {
    pub fn compile(pattern: &str) -> Result<Self, MatcherError> {
        let (path, query) = match pattern.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (pattern, None),
        };

        let mut segments = Vec::new();
        let mut parameters: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = path.char_indices().peekable();

        let push_param = |name: &str, parameters: &mut Vec<String>| {
            if name.is_empty() {
                return Err(MatcherError::EmptyParameter(pattern.to_string()));
            }
            if !name.chars().all(is_param_char) {
                return Err(MatcherError::InvalidParameter {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            if parameters.iter().any(|p| p == name) {
                return Err(MatcherError::DuplicateParameter {
                    pattern: pattern.to_string(),
                    name: name.to_string(),
                });
            }
            parameters.push(name.to_string());
            Ok(())
        };

        while let Some((i, c)) = chars.next() {
            match c {
                ':' => {
                    let start = i + 1;
                    let mut end = start;
                    while let Some(&(j, n)) = chars.peek() {
                        if !is_param_char(n) {
                            break;
                        }
                        end = j + n.len_utf8();
                        chars.next();
                    }
                    let name = &path[start..end];
                    push_param(name, &mut parameters)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(name.to_string()));
                }
                '{' => {
                    let close = path[i..]
                        .find('}')
                        .ok_or_else(|| MatcherError::UnterminatedPlaceholder(pattern.to_string()))?;
                    let name = path[i + 1..i + close].trim();
                    push_param(name, &mut parameters)?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Param(name.to_string()));
                    while let Some(&(j, _)) = chars.peek() {
                        if j > i + close {
                            break;
                        }
                        chars.next();
                    }
                }
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let mut query_params = Vec::new();
        for name in query.into_iter().flat_map(|q| q.split('&')) {
            if name.is_empty() {
                continue;
            }
            push_param(name, &mut parameters)?;
            query_params.push(name.to_string());
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            query: query_params,
            parameters,
        })
    }

    fn match_from(&self, index: usize, input: &str, pos: usize, out: &mut Params) -> bool {
        let Some(segment) = self.segments.get(index) else {
            return pos == input.len();
        };
        match segment {
            Segment::Literal(lit) => {
                input[pos..].starts_with(lit.as_str())
                    && self.match_from(index + 1, input, pos + lit.len(), out)
            }
            Segment::Param(name) => {
                let end = input[pos..]
                    .find('/')
                    .map(|offset| pos + offset)
                    .unwrap_or(input.len());
                for stop in (pos..=end).rev().filter(|&s| input.is_char_boundary(s)) {
                    if self.match_from(index + 1, input, stop, out) {
                        out.insert(name.clone(), Some(decode(&input[pos..stop])));
                        return true;
                    }
                }
                false
            }
        }
    }
}

impl UrlMatcher for PathMatcher {
    fn source(&self) -> &str {
        &self.source
    }

    fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn exec(&self, url: &str) -> Option<Params> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };

        let mut out = Params::new();
        if !self.match_from(0, path, 0, &mut out) {
            return None;
        }

        for name in &self.query {
            let value = query
                .split('&')
                .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
                .find(|(k, _)| decode(k) == *name)
                .map(|(_, v)| decode(v));
            out.insert(name.clone(), value);
        }
        Some(out)
    }

    fn format(&self, params: &Params) -> String {
        let mut url = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(lit) => url.push_str(lit),
                Segment::Param(name) => url.push_str(&encode(params.get(name).unwrap_or_default())),
            }
        }

        let query: Vec<String> = self
            .query
            .iter()
            .filter_map(|name| params.get(name).map(|v| format!("{name}={}", encode(v))))
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    fn concat(&self, pattern: &str) -> Result<Arc<dyn UrlMatcher>, MatcherError> {
        let (base, query) = match self.source.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (self.source.as_str(), None),
        };
        let combined = match (query, pattern.split_once('?')) {
            (Some(q), Some((path, more))) => format!("{base}{path}?{q}&{more}"),
            (Some(q), None) => format!("{base}{pattern}?{q}"),
            (None, _) => format!("{base}{pattern}"),
        };
        Ok(Arc::new(PathMatcher::compile(&combined)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_path_and_query_parameters() {
        let m = PathMatcher::compile("/users/:id/posts/{post}?page&sort").unwrap();
        assert_eq!(m.parameters(), &["id", "post", "page", "sort"]);
    }

    #[test]
    fn exec_matches_placeholders() {
        let m = PathMatcher::compile("/blog/post/:post").unwrap();
        let p = m.exec("/blog/post/42").unwrap();
        assert_eq!(p.get("post"), Some("42"));
        assert!(m.exec("/blog/post/42/comments").is_none());
        assert!(m.exec("/blog").is_none());
    }

    #[test]
    fn placeholder_followed_by_literal_in_same_segment() {
        let m = PathMatcher::compile("/files/:name.json").unwrap();
        let p = m.exec("/files/report.json").unwrap();
        assert_eq!(p.get("name"), Some("report"));
    }

    #[test]
    fn exec_reads_query_parameters() {
        let m = PathMatcher::compile("/search?q&page").unwrap();
        let p = m.exec("/search?q=rust").unwrap();
        assert_eq!(p.get("q"), Some("rust"));
        assert!(p.contains_key("page"));
        assert_eq!(p.get("page"), None);
    }

    #[test]
    fn format_substitutes_values() {
        let m = PathMatcher::compile("/category/{category}?page").unwrap();
        let url = m.format(&Params::new().with("category", "news").with("page", 2));
        assert_eq!(url, "/category/news?page=2");
        assert_eq!(m.format(&Params::new().with("category", "news")), "/category/news");
    }

    #[test]
    fn reserved_characters_survive_format_and_exec() {
        let m = PathMatcher::compile("/blog/post/:post?q").unwrap();
        let params = Params::new().with("post", "a/comments").with("q", "x&y=1#top");
        let url = m.format(&params);
        assert_eq!(url, "/blog/post/a%2Fcomments?q=x%26y%3D1%23top");

        let back = m.exec(&url).unwrap();
        assert_eq!(back.get("post"), Some("a/comments"));
        assert_eq!(back.get("q"), Some("x&y=1#top"));

        let nested = PathMatcher::compile("/blog/post/:post/comments").unwrap();
        assert!(nested.exec(&url).is_none());
    }

    #[test]
    fn exec_decodes_escaped_values() {
        let m = PathMatcher::compile("/search/:term").unwrap();
        let p = m.exec("/search/caf%C3%A9%20au%20lait").unwrap();
        assert_eq!(p.get("term"), Some("café au lait"));
    }

    #[test]
    fn concat_appends_relative_pattern() {
        let blog = PathMatcher::compile("/blog").unwrap();
        let post = blog.concat("/post/:post").unwrap();
        assert_eq!(post.source(), "/blog/post/:post");
        assert_eq!(post.parameters(), &["post"]);

        let recent = blog.concat("").unwrap();
        assert_eq!(recent.source(), "/blog");
    }

    #[test]
    fn concat_keeps_query_section_last() {
        let list = PathMatcher::compile("/list?page").unwrap();
        let item = list.concat("/:id?sort").unwrap();
        assert_eq!(item.source(), "/list/:id?page&sort");
    }

    #[test]
    fn rejects_bad_patterns() {
        assert!(matches!(
            PathMatcher::compile("/a/{id"),
            Err(MatcherError::UnterminatedPlaceholder(_))
        ));
        assert!(matches!(
            PathMatcher::compile("/a/:id/b/:id"),
            Err(MatcherError::DuplicateParameter { .. })
        ));
        assert!(matches!(
            PathMatcher::compile("/a/:"),
            Err(MatcherError::EmptyParameter(_))
        ));
        assert!(matches!(
            PathMatcher::compile("/a/{id:[0-9]+}"),
            Err(MatcherError::InvalidParameter { .. })
        ));
    }
}
