//! Deterministic file-backed page browser.
//!
//! [`FileBrowser`] serves pages from a root directory, which is enough to
//! run table tests offline and repeatably: `open` reads a file, `link=`
//! clicks follow the anchor's `href`, and form state (typed values,
//! checkbox toggles) lives in an overlay on top of the page markup.
//! Navigation lands synchronously, so the page-load predicate holds as
//! soon as a page is current.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use tracing::debug;

use crate::core::browser::{Browser, Locator};
use crate::io::html::clean_text;

struct PageState {
    /// Page path relative to the root, no leading slash.
    path: String,
    html: String,
    /// Typed input values, keyed by the raw locator string.
    values: BTreeMap<String, String>,
    /// Checkbox toggles, keyed by the raw locator string.
    checked: BTreeMap<String, bool>,
}

/// Browser backend reading HTML pages from a local directory.
pub struct FileBrowser {
    root: PathBuf,
    history: Vec<String>,
    page: Option<PageState>,
}

impl FileBrowser {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            history: Vec::new(),
            page: None,
        }
    }

    fn load(&mut self, path: &str) -> Result<PageState> {
        let rel = path.trim_start_matches('/');
        let file = self.root.join(rel);
        let html =
            fs::read_to_string(&file).with_context(|| format!("open page {}", file.display()))?;
        Ok(PageState {
            path: rel.to_string(),
            html,
            values: BTreeMap::new(),
            checked: BTreeMap::new(),
        })
    }

    fn page(&self) -> Result<&PageState> {
        self.page.as_ref().ok_or_else(|| anyhow!("no page is open"))
    }

    fn page_mut(&mut self) -> Result<&mut PageState> {
        self.page.as_mut().ok_or_else(|| anyhow!("no page is open"))
    }

    /// Resolve an href against the current page's directory.
    fn resolve_href(&self, href: &str) -> Result<String> {
        if let Some(absolute) = href.strip_prefix('/') {
            return Ok(absolute.to_string());
        }
        let current = self.page()?.path.clone();
        let dir = match current.rfind('/') {
            Some(idx) => &current[..idx + 1],
            None => "",
        };
        Ok(format!("{dir}{href}"))
    }

    /// Locate the element's opening tag and, for paired tags, its inner
    /// markup.
    fn find_element(&self, locator: &Locator) -> Result<Option<Element>> {
        let page = self.page()?;
        let (attr, value) = match locator {
            Locator::Id(id) => ("id", id),
            Locator::Name(name) => ("name", name),
            Locator::Link(text) => {
                return Ok(find_anchor_by_text(&page.html, text));
            }
        };
        Ok(find_by_attr(&page.html, attr, value))
    }
}

struct Element {
    opening_tag: String,
    tag_name: String,
    inner: Option<String>,
}

fn find_by_attr(html: &str, attr: &str, value: &str) -> Option<Element> {
    let open_re = Regex::new(&format!(
        r#"(?is)<([a-z0-9]+)\b[^>]*\b{attr}\s*=\s*["']{}["'][^>]*>"#,
        regex::escape(value)
    ))
    .expect("opening tag regex");
    let caps = open_re.captures(html)?;
    let opening_tag = caps[0].to_string();
    let tag_name = caps[1].to_lowercase();
    // The regex crate has no backreferences; find the matching close tag
    // in a second pass. Void elements simply have no close tag.
    let after_open = caps.get(0).expect("match").end();
    let close_re = Regex::new(&format!(r"(?is)</{tag_name}\s*>")).expect("closing tag regex");
    let inner = close_re
        .find(&html[after_open..])
        .map(|m| html[after_open..after_open + m.start()].to_string());
    Some(Element {
        opening_tag,
        tag_name,
        inner,
    })
}

fn find_anchor_by_text(html: &str, text: &str) -> Option<Element> {
    let anchor_re =
        Regex::new(r"(?is)<a\b[^>]*>(.*?)</a>").expect("anchor regex");
    for caps in anchor_re.captures_iter(html) {
        if clean_text(&caps[1]) == text {
            let opening_end = caps[0].find('>').expect("opening tag end") + 1;
            return Some(Element {
                opening_tag: caps[0][..opening_end].to_string(),
                tag_name: "a".to_string(),
                inner: Some(caps[1].to_string()),
            });
        }
    }
    None
}

fn attr_value(opening_tag: &str, attr: &str) -> Option<String> {
    let re = Regex::new(&format!(r#"(?is)\b{attr}\s*=\s*["']([^"']*)["']"#)).expect("attr regex");
    re.captures(opening_tag).map(|caps| caps[1].to_string())
}

fn has_attr(opening_tag: &str, attr: &str) -> bool {
    let re = Regex::new(&format!(r#"(?is)\b{attr}\b"#)).expect("attr presence regex");
    re.is_match(opening_tag)
}

fn is_checkbox(element: &Element) -> bool {
    element.tag_name == "input"
        && attr_value(&element.opening_tag, "type")
            .map(|t| t.eq_ignore_ascii_case("checkbox"))
            .unwrap_or(false)
}

impl Browser for FileBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        debug!(url = %url, "open");
        let next = self.load(url)?;
        if let Some(previous) = self.page.take() {
            self.history.push(previous.path);
        }
        self.page = Some(next);
        Ok(())
    }

    fn click(&mut self, locator: &str) -> Result<()> {
        debug!(locator = %locator, "click");
        let parsed = Locator::parse(locator);
        let element = self
            .find_element(&parsed)?
            .ok_or_else(|| anyhow!("element not found: {parsed}"))?;
        if element.tag_name == "a" {
            let href = attr_value(&element.opening_tag, "href")
                .ok_or_else(|| anyhow!("link has no href: {parsed}"))?;
            let path = self.resolve_href(&href)?;
            return self.open(&path);
        }
        if is_checkbox(&element) {
            let current = self.checked(locator)?;
            self.page_mut()?
                .checked
                .insert(locator.to_string(), !current);
            return Ok(());
        }
        bail!("element is not clickable: {parsed}")
    }

    fn set_value(&mut self, locator: &str, value: &str) -> Result<()> {
        let parsed = Locator::parse(locator);
        if self.find_element(&parsed)?.is_none() {
            bail!("element not found: {parsed}");
        }
        self.page_mut()?
            .values
            .insert(locator.to_string(), value.to_string());
        Ok(())
    }

    fn set_checked(&mut self, locator: &str, checked: bool) -> Result<()> {
        let parsed = Locator::parse(locator);
        let element = self
            .find_element(&parsed)?
            .ok_or_else(|| anyhow!("element not found: {parsed}"))?;
        if !is_checkbox(&element) {
            bail!("element is not a checkbox: {parsed}");
        }
        self.page_mut()?
            .checked
            .insert(locator.to_string(), checked);
        Ok(())
    }

    fn go_back(&mut self) -> Result<()> {
        let previous = self
            .history
            .pop()
            .ok_or_else(|| anyhow!("no page to go back to"))?;
        self.page = Some(self.load(&previous)?);
        Ok(())
    }

    fn refresh(&mut self) -> Result<()> {
        let current = self.page()?.path.clone();
        self.page = Some(self.load(&current)?);
        Ok(())
    }

    fn title(&mut self) -> Result<String> {
        let page = self.page()?;
        let title_re = Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("title regex");
        Ok(title_re
            .captures(&page.html)
            .map(|caps| clean_text(&caps[1]))
            .unwrap_or_default())
    }

    fn text(&mut self, locator: &str) -> Result<String> {
        let parsed = Locator::parse(locator);
        let element = self
            .find_element(&parsed)?
            .ok_or_else(|| anyhow!("element not found: {parsed}"))?;
        Ok(element.inner.as_deref().map(clean_text).unwrap_or_default())
    }

    fn value(&mut self, locator: &str) -> Result<String> {
        if let Some(overridden) = self.page()?.values.get(locator) {
            return Ok(overridden.clone());
        }
        let parsed = Locator::parse(locator);
        let element = self
            .find_element(&parsed)?
            .ok_or_else(|| anyhow!("element not found: {parsed}"))?;
        Ok(attr_value(&element.opening_tag, "value").unwrap_or_default())
    }

    fn location(&mut self) -> Result<String> {
        Ok(format!("/{}", self.page()?.path))
    }

    fn element_present(&mut self, locator: &str) -> Result<bool> {
        Ok(self.find_element(&Locator::parse(locator))?.is_some())
    }

    fn checked(&mut self, locator: &str) -> Result<bool> {
        if let Some(toggled) = self.page()?.checked.get(locator) {
            return Ok(*toggled);
        }
        let parsed = Locator::parse(locator);
        let element = self
            .find_element(&parsed)?
            .ok_or_else(|| anyhow!("element not found: {parsed}"))?;
        if !is_checkbox(&element) {
            bail!("element is not a checkbox: {parsed}");
        }
        Ok(has_attr(&element.opening_tag, "checked"))
    }

    fn page_text(&mut self) -> Result<String> {
        let page = self.page()?;
        let body_re = Regex::new(r"(?is)<body\b[^>]*>(.*?)</body>").expect("body regex");
        let region = body_re
            .captures(&page.html)
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| page.html.clone());
        Ok(clean_text(&region))
    }

    fn eval_script(&mut self, _expr: &str) -> Result<String> {
        bail!("javascript evaluation is not supported by the file-backed browser")
    }

    fn page_load_complete(&mut self) -> Result<bool> {
        Ok(self.page.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PageDir;

    const INDEX: &str = r#"
        <html>
          <head><title>Home</title></head>
          <body>
            <h1 id="header">Welcome <b>home</b></h1>
            <a href="about.html">About us</a>
            <input id="q" type="text" value="initial">
            <input id="opt" type="checkbox" checked>
          </body>
        </html>
    "#;

    const ABOUT: &str = r#"
        <html>
          <head><title>About</title></head>
          <body><p id="blurb">We make things.</p></body>
        </html>
    "#;

    fn fixture() -> (PageDir, FileBrowser) {
        let pages = PageDir::new().expect("page dir");
        pages.write("index.html", INDEX).expect("write index");
        pages.write("about.html", ABOUT).expect("write about");
        let browser = FileBrowser::new(pages.root());
        (pages, browser)
    }

    #[test]
    fn open_reads_title_and_text() {
        let (_pages, mut browser) = fixture();
        browser.open("/index.html").expect("open");
        assert_eq!(browser.title().expect("title"), "Home");
        assert_eq!(browser.text("id=header").expect("text"), "Welcome home");
        assert_eq!(browser.location().expect("location"), "/index.html");
    }

    #[test]
    fn link_click_navigates_and_back_returns() {
        let (_pages, mut browser) = fixture();
        browser.open("/index.html").expect("open");
        browser.click("link=About us").expect("click");
        assert_eq!(browser.title().expect("title"), "About");
        assert!(browser.page_load_complete().expect("load"));
        browser.go_back().expect("back");
        assert_eq!(browser.title().expect("title"), "Home");
    }

    #[test]
    fn typed_value_overlays_until_refresh() {
        let (_pages, mut browser) = fixture();
        browser.open("/index.html").expect("open");
        assert_eq!(browser.value("id=q").expect("value"), "initial");
        browser.set_value("id=q", "typed").expect("type");
        assert_eq!(browser.value("id=q").expect("value"), "typed");
        browser.refresh().expect("refresh");
        assert_eq!(browser.value("id=q").expect("value"), "initial");
    }

    #[test]
    fn checkbox_click_toggles_from_markup_state() {
        let (_pages, mut browser) = fixture();
        browser.open("/index.html").expect("open");
        assert!(browser.checked("id=opt").expect("checked"));
        browser.click("id=opt").expect("click");
        assert!(!browser.checked("id=opt").expect("checked"));
        browser.set_checked("id=opt", true).expect("check");
        assert!(browser.checked("id=opt").expect("checked"));
    }

    #[test]
    fn element_presence_and_page_text() {
        let (_pages, mut browser) = fixture();
        browser.open("/index.html").expect("open");
        assert!(browser.element_present("id=header").expect("present"));
        assert!(!browser.element_present("id=nope").expect("present"));
        let text = browser.page_text().expect("page text");
        assert!(text.contains("Welcome home"));
        assert!(text.contains("About us"));
    }

    #[test]
    fn missing_page_is_a_contextual_error() {
        let (_pages, mut browser) = fixture();
        let err = browser.open("/missing.html").unwrap_err();
        assert!(format!("{err:#}").contains("open page"));
    }

    #[test]
    fn scripts_are_rejected() {
        let (_pages, mut browser) = fixture();
        browser.open("/index.html").expect("open");
        let err = browser.eval_script("1+1").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }
}
