//! Glob patterns over `/`-separated object keys

use crate::error::{Error, Result};
use regex::Regex;

/// A compiled glob pattern
///
/// - `*` matches any run of characters within one segment
/// - `?` matches one character within a segment
/// - `**` matches any number of whole segments (including none)
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    literal_prefix: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = pattern.trim_matches('/');
        if pattern.is_empty() {
            return Err(Error::config("Glob pattern cannot be empty"));
        }

        let segments: Vec<&str> = pattern.split('/').collect();
        let mut expr = String::from("^");

        for (i, segment) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            if *segment == "**" {
                // Zero or more whole segments, each followed by '/'
                expr.push_str(if last { ".*" } else { "(?:[^/]*/)*" });
                continue;
            }
            for ch in segment.chars() {
                match ch {
                    '*' => expr.push_str("[^/]*"),
                    '?' => expr.push_str("[^/]"),
                    c => expr.push_str(&regex::escape(&c.to_string())),
                }
            }
            if !last {
                expr.push('/');
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;

        let literal_prefix = segments
            .iter()
            .take_while(|s| !s.contains(['*', '?']))
            .take(segments.len().saturating_sub(1))
            .copied()
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            pattern: pattern.to_string(),
            literal_prefix,
            regex,
        })
    }

    /// Check whether a relative key matches
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Leading directories that contain no wildcard, used to narrow listings
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}
