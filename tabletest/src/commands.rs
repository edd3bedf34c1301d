//! Built-in command vocabulary.
//!
//! Every entry here is registered explicitly; there is no discovery by
//! naming convention beyond the derived-set synthesis the registry itself
//! performs. [`builtin_registry`] is the table the CLI runs with.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::core::pattern::Pattern;
use crate::core::registry::{AccessorKind, AccessorValue, Registry};

/// Register the built-in vocabulary into `registry`.
///
/// Registration is idempotent, so calling this on a registry that already
/// holds the builtins replaces them in place.
pub fn register_builtins(registry: &mut Registry) {
    // Actions. Each also gets its `…AndWait` variant.
    registry.register_action("open", |_, browser, target, _| browser.open(target));
    registry.register_action("click", |_, browser, target, _| browser.click(target));
    registry.register_action("type", |_, browser, target, value| {
        browser.set_value(target, value)
    });
    registry.register_action("check", |_, browser, target, _| {
        browser.set_checked(target, true)
    });
    registry.register_action("uncheck", |_, browser, target, _| {
        browser.set_checked(target, false)
    });
    registry.register_action("goBack", |_, browser, _, _| browser.go_back());
    registry.register_action("refresh", |_, browser, _, _| browser.refresh());

    // Harness actions touch the session rather than the page.
    registry.register_action("pause", |session, _, target, _| {
        let ms = parse_millis(target)?;
        session.request_pause(Duration::from_millis(ms));
        Ok(())
    });
    registry.register_action("setSpeed", |session, _, target, _| {
        let ms: i64 = target
            .trim()
            .parse()
            .with_context(|| format!("setSpeed: not a number of milliseconds: '{target}'"))?;
        session.set_speed_ms(ms);
        Ok(())
    });
    registry.register_action("setTimeout", |session, _, target, _| {
        let ms = parse_millis(target)?;
        session.set_timeout(Duration::from_millis(ms));
        Ok(())
    });
    registry.register_action("echo", |_, _, target, _| {
        info!(message = %target, "echo");
        Ok(())
    });

    // Accessors. Each yields get*/is*, store*, assert*/assertNot*,
    // verify*/verifyNot*, waitFor*/waitForNot*.
    registry.register_accessor("Title", AccessorKind::Value, false, |_, browser, _| {
        Ok(AccessorValue::Str(browser.title()?))
    });
    registry.register_accessor("Location", AccessorKind::Value, false, |_, browser, _| {
        Ok(AccessorValue::Str(browser.location()?))
    });
    registry.register_accessor("Text", AccessorKind::Value, true, |_, browser, locator| {
        Ok(AccessorValue::Str(browser.text(locator)?))
    });
    registry.register_accessor("Value", AccessorKind::Value, true, |_, browser, locator| {
        Ok(AccessorValue::Str(browser.value(locator)?))
    });
    // The argument has already been through substitution; the accessor just
    // reflects it back, which makes storeExpression/assertExpression work.
    registry.register_accessor("Expression", AccessorKind::Value, true, |_, _, arg| {
        Ok(AccessorValue::Str(arg.to_string()))
    });
    registry.register_accessor(
        "ElementPresent",
        AccessorKind::Predicate,
        true,
        |_, browser, locator| Ok(AccessorValue::Bool(browser.element_present(locator)?)),
    );
    registry.register_accessor(
        "TextPresent",
        AccessorKind::Predicate,
        true,
        |_, browser, pattern| {
            let page = browser.page_text()?;
            Ok(AccessorValue::Bool(Pattern::parse(pattern).found_in(&page)?))
        },
    );

    // Direct assertion on checkbox state; takes only a locator.
    registry.register_assertion("Checked", |_, browser, target, _| {
        if browser.checked(target)? {
            Ok(None)
        } else {
            Ok(Some(
                "Actual value 'false' did not match 'true'".to_string(),
            ))
        }
    });

    registry
        .alias("store", "storeExpression")
        .expect("storeExpression is registered above");
}

/// A registry preloaded with the built-in vocabulary.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    registry
}

fn parse_millis(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .with_context(|| format!("not a number of milliseconds: '{raw}'"))
}
