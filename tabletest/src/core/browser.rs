//! Browser abstraction the command vocabulary acts against.
//!
//! The [`Browser`] trait decouples command handlers from the actual page
//! backend (the bundled [`crate::io::browser::FileBrowser`], or anything
//! else). Tests use scripted browsers that return predetermined values
//! without touching the filesystem.

use std::fmt;

use anyhow::Result;

/// Element locator: `id=…`, `name=…`, `link=…`; a bare locator means `id=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Id(String),
    Name(String),
    Link(String),
}

impl Locator {
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("id=") {
            Locator::Id(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("name=") {
            Locator::Name(rest.to_string())
        } else if let Some(rest) = raw.strip_prefix("link=") {
            Locator::Link(rest.to_string())
        } else {
            Locator::Id(raw.to_string())
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={id}"),
            Locator::Name(name) => write!(f, "name={name}"),
            Locator::Link(text) => write!(f, "link={text}"),
        }
    }
}

/// Abstraction over page backends.
///
/// Locator arguments are the raw strings from the table; implementations
/// parse them with [`Locator::parse`]. Every method takes `&mut self`
/// because backends are stateful (navigation history, form overlays,
/// scripted poll counters).
pub trait Browser {
    /// Navigate to a URL or page path.
    fn open(&mut self, url: &str) -> Result<()>;
    /// Click the located element (link navigation, checkbox toggle).
    fn click(&mut self, locator: &str) -> Result<()>;
    /// Set the value of the located input.
    fn set_value(&mut self, locator: &str, value: &str) -> Result<()>;
    /// Check or uncheck the located checkbox.
    fn set_checked(&mut self, locator: &str, checked: bool) -> Result<()>;
    /// Navigate back in history.
    fn go_back(&mut self) -> Result<()>;
    /// Reload the current page, discarding form state.
    fn refresh(&mut self) -> Result<()>;

    /// Title of the current page.
    fn title(&mut self) -> Result<String>;
    /// Visible text of the located element, tags stripped.
    fn text(&mut self, locator: &str) -> Result<String>;
    /// Current value of the located input.
    fn value(&mut self, locator: &str) -> Result<String>;
    /// Current location (page path or URL).
    fn location(&mut self) -> Result<String>;
    /// Whether the located element exists on the current page.
    fn element_present(&mut self, locator: &str) -> Result<bool>;
    /// Whether the located checkbox is checked.
    fn checked(&mut self, locator: &str) -> Result<bool>;
    /// Full visible text of the current page.
    fn page_text(&mut self) -> Result<String>;

    /// Evaluate a `javascript{…}` expression. Backends without script
    /// support report an error, which surfaces as a command failure.
    fn eval_script(&mut self, expr: &str) -> Result<String>;

    /// Page-load predicate polled by `…AndWait` commands. An error counts
    /// as "not yet loaded" and is retried until the wait deadline.
    fn page_load_complete(&mut self) -> Result<bool>;
}
