//! Matching for SQL LIKE patterns as accepted by `SHOW ... LIKE`.
use regex::{Regex, RegexBuilder, escape};

use crate::errors::{CatalogError, Result};

/// A compiled LIKE pattern.
///
/// `%` matches any sequence, `_` matches a single character and `\` escapes
/// the next character. Matching is case insensitive.
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: Regex,
}

impl LikePattern {
    pub fn try_new(pattern: &str) -> Result<Self> {
        let regex = like_pattern_to_regex(&mut String::new(), pattern, Some('\\'))?;
        Ok(LikePattern { regex })
    }

    /// Compile an optional pattern. A missing pattern matches everything.
    pub fn try_new_optional(pattern: Option<&str>) -> Result<Option<Self>> {
        pattern.map(Self::try_new).transpose()
    }

    pub fn is_match(&self, s: &str) -> bool {
        self.regex.is_match(s)
    }
}

fn like_pattern_to_regex(
    buf: &mut String,
    pattern: &str,
    escape_char: Option<char>,
) -> Result<Regex> {
    buf.clear();
    buf.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if Some(c) == escape_char {
            match chars.next() {
                Some(next_char) => buf.push_str(&escape(&next_char.to_string())),
                // Trailing escape is taken literally.
                None => buf.push_str(&escape(&c.to_string())),
            }
            continue;
        }
        match c {
            '%' => buf.push_str(".*"),
            '_' => buf.push('.'),
            _ => buf.push_str(&escape(&c.to_string())),
        }
    }
    buf.push('$');

    RegexBuilder::new(buf)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
