//! Test table parsing.
//!
//! A test is an HTML table: the first row is the title, and each
//! subsequent row's first three cells are `(command, target, value)`.
//! Missing cells read as empty strings. A row with `class="breakpoint"`
//! marks its command as a breakpoint.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use regex::Regex;

use crate::core::command::Command;
use crate::io::html::clean_text;

/// One parsed test: title plus its command rows in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub title: String,
    pub commands: Vec<Command>,
}

/// Parse a test from HTML table markup.
pub fn parse_test(html: &str) -> Result<TestCase> {
    let row_re = Regex::new(r"(?is)<tr\b([^>]*)>(.*?)</tr>").expect("row regex");
    let cell_re = Regex::new(r"(?is)<t[dh]\b[^>]*>(.*?)</t[dh]>").expect("cell regex");
    let breakpoint_re =
        Regex::new(r#"(?i)class\s*=\s*["'][^"']*\bbreakpoint\b"#).expect("breakpoint regex");

    let mut rows = row_re.captures_iter(html);
    let title_row = match rows.next() {
        Some(caps) => caps,
        None => bail!("no test table rows found in input"),
    };
    let title = cell_re
        .captures(&title_row[2])
        .map(|caps| clean_text(&caps[1]))
        .unwrap_or_default();

    let mut commands = Vec::new();
    for caps in rows {
        let attrs = caps[1].to_string();
        let cells: Vec<String> = cell_re
            .captures_iter(&caps[2])
            .map(|cell| clean_text(&cell[1]))
            .collect();
        let name = cells.first().cloned().unwrap_or_default();
        if name.is_empty() {
            // Spacer or comment row.
            continue;
        }
        let mut command = Command::new(
            &name,
            cells.get(1).map(String::as_str).unwrap_or(""),
            cells.get(2).map(String::as_str).unwrap_or(""),
        );
        command.breakpoint = breakpoint_re.is_match(&attrs);
        commands.push(command);
    }

    Ok(TestCase { title, commands })
}

/// Read and parse a test file.
pub fn load_test(path: &Path) -> Result<TestCase> {
    let html = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_test(&html).with_context(|| format!("parse {}", path.display()))
}
