//! String patterns for expected values: `glob:`, `regexp:`, and `exact:`.
//!
//! A pattern spec without a prefix is treated as a glob, matching the
//! historical table-test convention. [`Pattern::matches`] is anchored
//! (full-string); [`Pattern::found_in`] searches anywhere, which is what
//! text-presence checks want.

use anyhow::{Context, Result};
use regex::Regex;

/// Parsed expected-value pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Glob(String),
    Regexp(String),
    Exact(String),
}

impl Pattern {
    /// Parse a pattern spec, honoring an optional `glob:`/`regexp:`/`exact:`
    /// prefix. No prefix means glob.
    pub fn parse(spec: &str) -> Self {
        if let Some(rest) = spec.strip_prefix("glob:") {
            Pattern::Glob(rest.to_string())
        } else if let Some(rest) = spec.strip_prefix("regexp:") {
            Pattern::Regexp(rest.to_string())
        } else if let Some(rest) = spec.strip_prefix("exact:") {
            Pattern::Exact(rest.to_string())
        } else {
            Pattern::Glob(spec.to_string())
        }
    }

    /// Full-string match against `actual`.
    pub fn matches(&self, actual: &str) -> Result<bool> {
        match self {
            Pattern::Exact(expected) => Ok(actual == expected),
            Pattern::Glob(glob) => {
                let re = compile(&format!("^(?s:{})$", glob_to_regex(glob)), glob)?;
                Ok(re.is_match(actual))
            }
            Pattern::Regexp(body) => {
                let re = compile(&format!("^(?s:{body})$"), body)?;
                Ok(re.is_match(actual))
            }
        }
    }

    /// Unanchored search: does the pattern occur anywhere in `text`?
    pub fn found_in(&self, text: &str) -> Result<bool> {
        match self {
            Pattern::Exact(expected) => Ok(text.contains(expected)),
            Pattern::Glob(glob) => {
                let re = compile(&format!("(?s:{})", glob_to_regex(glob)), glob)?;
                Ok(re.is_match(text))
            }
            Pattern::Regexp(body) => {
                let re = compile(&format!("(?s:{body})"), body)?;
                Ok(re.is_match(text))
            }
        }
    }
}

fn compile(pattern: &str, original: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid pattern '{original}'"))
}

/// Translate a glob into regex syntax: `*` matches any run of characters,
/// `?` matches one; everything else is literal.
fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2);
    for ch in glob.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&ch.to_string())),
        }
    }
    out
}
