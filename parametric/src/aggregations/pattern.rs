//! Glob-style value restrictions.
//!
//! `*` matches any run of characters and `?` exactly one. Patterns are
//! anchored at both ends and ignore case, so `*LUG*` admits `slugs`.

use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
pub struct ValuePattern {
    regex: Regex,
}

impl ValuePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut regex_str = String::with_capacity(pattern.len() + 8);
        regex_str.push('^');

        for c in pattern.chars() {
            match c {
                '*' => regex_str.push_str(".*"),
                '?' => regex_str.push('.'),
                _ => {
                    let mut buf = [0u8; 4];
                    regex_str.push_str(&regex::escape(c.encode_utf8(&mut buf)));
                }
            }
        }

        regex_str.push('$');

        let regex = RegexBuilder::new(&regex_str)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|e| Error::invalid_argument(format!("Invalid value pattern '{}': {}", pattern, e)))?;

        Ok(Self { regex })
    }

    pub fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// A set of patterns combined with OR. The empty set admits every value.
#[derive(Debug, Clone, Default)]
pub struct ValuePatterns {
    patterns: Vec<ValuePattern>,
}

impl ValuePatterns {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| ValuePattern::new(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn admits(&self, value: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|p| p.matches(value))
    }
}
