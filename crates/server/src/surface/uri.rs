//! Resource URI templates.
//!
//! Templates carry named segments in braces, e.g.
//! `splunk://indexes/{name}`. A parameter matches one non-empty span that
//! contains no `/`. When several templates match a URI, the one with the
//! most literal characters wins (longest-specific-wins), which makes exact
//! URIs beat templates automatically.

use std::collections::HashMap;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed resource URI template.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason for unbalanced braces, empty or
    /// non-identifier parameter names, or adjacent parameters.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut rest = raw;
        let mut last_was_param = false;

        while !rest.is_empty() {
            match rest.find('{') {
                Some(start) => {
                    if start > 0 {
                        segments.push(Segment::Literal(rest[..start].to_string()));
                        last_was_param = false;
                    } else if last_was_param {
                        return Err("adjacent parameters are ambiguous".to_string());
                    }
                    let after = &rest[start + 1..];
                    let end = after
                        .find('}')
                        .ok_or_else(|| format!("unbalanced braces in '{raw}'"))?;
                    let name = &after[..end];
                    if name.is_empty()
                        || !name
                            .chars()
                            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                    {
                        return Err(format!("bad parameter name '{{{name}}}' in '{raw}'"));
                    }
                    segments.push(Segment::Param(name.to_string()));
                    last_was_param = true;
                    rest = &after[end + 1..];
                }
                None => {
                    if rest.contains('}') {
                        return Err(format!("unbalanced braces in '{raw}'"));
                    }
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
            }
        }

        if segments.is_empty() {
            return Err("empty URI template".to_string());
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The original template string.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the template carries any parameters.
    pub fn is_templated(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_)))
    }

    /// Number of literal characters; the longest-specific-wins score.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => text.len(),
                Segment::Param(_) => 0,
            })
            .sum()
    }

    /// Match a URI, returning the bound parameter values on success.
    pub fn bind(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut binding = HashMap::new();
        let mut rest = uri;

        let mut iter = self.segments.iter().peekable();
        while let Some(segment) = iter.next() {
            match segment {
                Segment::Literal(text) => {
                    rest = rest.strip_prefix(text.as_str())?;
                }
                Segment::Param(name) => {
                    let end = match iter.peek() {
                        Some(Segment::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    binding.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(binding)
    }
}
