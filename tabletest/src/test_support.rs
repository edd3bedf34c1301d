//! Scripted fakes and fixtures for tests.
//!
//! Compiled for unit tests and for downstream integration tests through the
//! `test-support` feature.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use tempfile::TempDir;

use crate::core::browser::Browser;
use crate::core::command::Command;
use crate::io::table::TestCase;

/// A browser that answers from scripted tables instead of pages.
///
/// Populate the public fields, then hand it to the code under test. Actions
/// are recorded in `opened`/`clicked`/`typed` for assertion afterwards.
#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    pub title: String,
    pub location: String,
    /// Element text by raw locator.
    pub texts: BTreeMap<String, String>,
    /// Input values by raw locator.
    pub values: BTreeMap<String, String>,
    /// Checkbox state by raw locator.
    pub checks: BTreeMap<String, bool>,
    /// Scripted `javascript{…}` results by expression.
    pub scripts: BTreeMap<String, String>,
    /// How many load polls report "not yet" after each navigation.
    pub load_delay_polls: u32,
    /// When set, the page never finishes loading.
    pub load_never_completes: bool,
    polls_left: u32,

    pub opened: Vec<String>,
    pub clicked: Vec<String>,
    pub typed: Vec<(String, String)>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Browser for ScriptedBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        self.opened.push(url.to_string());
        self.location = url.to_string();
        self.polls_left = self.load_delay_polls;
        Ok(())
    }

    fn click(&mut self, locator: &str) -> Result<()> {
        self.clicked.push(locator.to_string());
        self.polls_left = self.load_delay_polls;
        Ok(())
    }

    fn set_value(&mut self, locator: &str, value: &str) -> Result<()> {
        self.typed.push((locator.to_string(), value.to_string()));
        self.values.insert(locator.to_string(), value.to_string());
        Ok(())
    }

    fn set_checked(&mut self, locator: &str, checked: bool) -> Result<()> {
        self.checks.insert(locator.to_string(), checked);
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    fn title(&mut self) -> Result<String> {
        Ok(self.title.clone())
    }

    fn text(&mut self, locator: &str) -> Result<String> {
        match self.texts.get(locator) {
            Some(text) => Ok(text.clone()),
            None => bail!("no element '{locator}'"),
        }
    }

    fn value(&mut self, locator: &str) -> Result<String> {
        match self.values.get(locator) {
            Some(value) => Ok(value.clone()),
            None => bail!("no element '{locator}'"),
        }
    }

    fn location(&mut self) -> Result<String> {
        Ok(self.location.clone())
    }

    fn element_present(&mut self, locator: &str) -> Result<bool> {
        Ok(self.texts.contains_key(locator)
            || self.values.contains_key(locator)
            || self.checks.contains_key(locator))
    }

    fn checked(&mut self, locator: &str) -> Result<bool> {
        match self.checks.get(locator) {
            Some(checked) => Ok(*checked),
            None => bail!("no element '{locator}'"),
        }
    }

    fn page_text(&mut self) -> Result<String> {
        let mut parts: Vec<&str> = vec![&self.title];
        parts.extend(self.texts.values().map(String::as_str));
        Ok(parts.join(" "))
    }

    fn eval_script(&mut self, expr: &str) -> Result<String> {
        match self.scripts.get(expr) {
            Some(result) => Ok(result.clone()),
            None => bail!("no scripted result for '{expr}'"),
        }
    }

    fn page_load_complete(&mut self) -> Result<bool> {
        if self.load_never_completes {
            return Ok(false);
        }
        if self.polls_left > 0 {
            self.polls_left -= 1;
            return Ok(false);
        }
        Ok(true)
    }
}

/// A temporary directory of page and table fixtures.
pub struct PageDir {
    dir: TempDir,
}

impl PageDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Write a fixture file at a path relative to the directory root.
    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Shorthand for building a [`Command`] in tests.
pub fn command(name: &str, target: &str, value: &str) -> Command {
    Command::new(name, target, value)
}

/// Shorthand for building a [`TestCase`] in tests.
pub fn test_case(title: &str, commands: Vec<Command>) -> TestCase {
    TestCase {
        title: title.to_string(),
        commands,
    }
}
