//! Suite file parsing: an HTML table of links, one test per row.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::io::html::clean_text;

/// One suite entry: display name and the test's href, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteEntry {
    pub name: String,
    pub href: String,
}

/// A parsed suite: title plus test entries in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    pub title: String,
    pub tests: Vec<SuiteEntry>,
}

fn anchor_re() -> Regex {
    Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*["']([^"']+)["'][^>]*>(.*?)</a>"#).expect("anchor regex")
}

/// Parse a suite from HTML table markup.
pub fn parse_suite(html: &str) -> Result<Suite> {
    let row_re = Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("row regex");
    let anchor_re = anchor_re();

    let mut rows = row_re.captures_iter(html);
    let title = match rows.next() {
        Some(caps) => clean_text(&caps[1]),
        None => bail!("no suite table rows found in input"),
    };

    let mut tests = Vec::new();
    for caps in rows {
        if let Some(anchor) = anchor_re.captures(&caps[1]) {
            tests.push(SuiteEntry {
                href: anchor[1].to_string(),
                name: clean_text(&anchor[2]),
            });
        }
    }
    if tests.is_empty() {
        bail!("suite contains no test links");
    }
    Ok(Suite { title, tests })
}

/// Read and parse a suite file.
pub fn load_suite(path: &Path) -> Result<Suite> {
    let html = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_suite(&html).with_context(|| format!("parse {}", path.display()))
}

/// Heuristic used by the CLI to tell suites from tests: a suite's data rows
/// are links rather than command triples.
pub fn looks_like_suite(html: &str) -> bool {
    anchor_re().is_match(html)
}
