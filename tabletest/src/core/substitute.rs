//! Argument preprocessing: `${name}` variable substitution and
//! `javascript{…}` script expressions.
//!
//! Both are string transforms applied to a command's target/value before
//! dispatch; they are not part of the loop's control flow. Unresolved
//! `${name}` references are left verbatim.

use anyhow::Result;
use regex::Regex;

use crate::core::browser::Browser;
use crate::core::session::Session;

/// Substitute one command argument: resolve `${name}` references from the
/// session, then evaluate a whole-argument `javascript{…}` form through the
/// browser backend.
pub fn substitute(session: &Session, browser: &mut dyn Browser, raw: &str) -> Result<String> {
    if let Some(body) = script_body(raw) {
        let expr = replace_variables(session, body);
        return browser.eval_script(&expr);
    }
    Ok(replace_variables(session, raw))
}

/// Replace `${name}` references from the stored-variable table.
pub fn replace_variables(session: &Session, raw: &str) -> String {
    let var_re = Regex::new(r"\$\{(\w+)\}").expect("variable regex");
    let mut out = String::with_capacity(raw.len());
    let mut last = 0;
    for caps in var_re.captures_iter(raw) {
        let whole = caps.get(0).expect("match");
        out.push_str(&raw[last..whole.start()]);
        match session.var(&caps[1]) {
            Some(value) => out.push_str(value),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&raw[last..]);
    out
}

/// Extract the expression from an argument of the exact form
/// `javascript{…}`.
fn script_body(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix("javascript{")?;
    body.strip_suffix('}')
}
