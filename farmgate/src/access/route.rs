//! Path normalization and route templates.
//!
//! Routes are registered as templates like `/users/edit/[id]`, where a
//! bracketed segment matches any single path segment. A request path matches
//! a template when every template segment matches the corresponding path
//! segment; the path may extend beyond the template (prefix matching), which
//! is what lets `/products/edit/[id]` cover nested sub-pages without a
//! separate entry per screen.

use std::cmp::Ordering;
use std::fmt;

/// Normalize a request path for matrix lookup.
///
/// Drops the query string and fragment, collapses duplicate slashes, and
/// strips the trailing slash (`/` itself stays `/`).
pub fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let mut out = String::with_capacity(path.len() + 1);
    out.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(segment);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A registered route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

/// How strongly a pattern matched a path. Ordered so that an exact match
/// beats any template match, a longer template beats a shorter one, and more
/// literal segments break remaining ties. Field order carries the priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchStrength {
    exact: bool,
    segments: usize,
    literals: usize,
}

impl MatchStrength {
    /// Full-length, all-literal match: the path equals the registered route.
    pub fn is_exact(&self) -> bool {
        self.exact
    }
}

impl RoutePattern {
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize(raw);
        let segments = normalized
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('[') && s.ends_with(']') && s.len() > 2 {
                    Segment::Param(s[1..s.len() - 1].to_string())
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self { raw: normalized, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this template contains `[param]` segments (and therefore does
    /// not denote a single concrete page, e.g. for menu construction).
    pub fn has_params(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Param(_)))
    }

    /// The axum router syntax for this template (`[id]` becomes `{id}`).
    pub fn axum_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Param(name) => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
        }
        out
    }

    /// Match a normalized path against this template.
    ///
    /// Returns `None` on a mismatch, otherwise the strength of the match for
    /// the exact-beats-template, longest-prefix-wins tie-break.
    pub fn match_strength(&self, path: &str) -> Option<MatchStrength> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // The root template matches only the root path.
        if self.segments.is_empty() {
            return parts.is_empty().then_some(MatchStrength {
                exact: true,
                segments: 0,
                literals: 0,
            });
        }

        if parts.len() < self.segments.len() {
            return None;
        }

        let mut literals = 0;
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(expected) if expected == part => literals += 1,
                Segment::Literal(_) => return None,
                Segment::Param(_) => {}
            }
        }

        let all_literal = literals == self.segments.len();
        Some(MatchStrength {
            exact: all_literal && parts.len() == self.segments.len(),
            segments: self.segments.len(),
            literals,
        })
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialOrd for RoutePattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RoutePattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}
