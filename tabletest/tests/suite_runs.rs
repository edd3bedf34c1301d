//! Suite runs over the file-backed browser, end to end from HTML on disk.

use tabletest::commands::builtin_registry;
use tabletest::core::browser::Browser;
use tabletest::core::session::Session;
use tabletest::io::browser::FileBrowser;
use tabletest::io::report::{SuiteReport, write_report};
use tabletest::io::suite::load_suite;
use tabletest::looping::{BreakPolicy, RunStop};
use tabletest::suite_run::run_suite;
use tabletest::test_support::PageDir;

const INDEX: &str = r#"
    <html>
      <head><title>Home</title></head>
      <body>
        <h1 id="header">Welcome</h1>
        <a href="about.html">About us</a>
      </body>
    </html>
"#;

const ABOUT: &str = r#"
    <html>
      <head><title>About</title></head>
      <body><p id="blurb">We make things.</p></body>
    </html>
"#;

fn fixture() -> PageDir {
    let pages = PageDir::new().expect("page dir");
    pages.write("index.html", INDEX).expect("index");
    pages.write("about.html", ABOUT).expect("about");

    pages
        .write(
            "navigate.html",
            r#"<table>
                 <tr><td>navigate</td></tr>
                 <tr><td>open</td><td>/index.html</td><td></td></tr>
                 <tr><td>clickAndWait</td><td>link=About us</td><td></td></tr>
                 <tr><td>assertTitle</td><td>About</td><td></td></tr>
                 <tr><td>assertLocation</td><td>/about.html</td><td></td></tr>
               </table>"#,
        )
        .expect("navigate test");
    pages
        .write(
            "failing.html",
            r#"<table>
                 <tr><td>failing</td></tr>
                 <tr><td>open</td><td>/index.html</td><td></td></tr>
                 <tr><td>assertTitle</td><td>Wrong Title</td><td></td></tr>
                 <tr><td>echo</td><td>unreached</td><td></td></tr>
               </table>"#,
        )
        .expect("failing test");
    pages
        .write(
            "stores.html",
            r#"<table>
                 <tr><td>stores</td></tr>
                 <tr><td>open</td><td>/about.html</td><td></td></tr>
                 <tr><td>storeTitle</td><td>t</td><td></td></tr>
                 <tr><td>verifyText</td><td>id=blurb</td><td>We make *</td></tr>
                 <tr><td>assertExpression</td><td>${t}</td><td>About</td></tr>
               </table>"#,
        )
        .expect("stores test");
    pages
        .write(
            "suite.html",
            r#"<table>
                 <tr><td>Demo Suite</td></tr>
                 <tr><td><a href="navigate.html">Navigate</a></td></tr>
                 <tr><td><a href="failing.html">Failing</a></td></tr>
                 <tr><td><a href="stores.html">Stores</a></td></tr>
               </table>"#,
        )
        .expect("suite");
    pages
}

#[test]
fn suite_aggregates_and_keeps_going_past_failures() {
    let pages = fixture();
    let registry = builtin_registry();
    let suite = load_suite(&pages.root().join("suite.html")).expect("load suite");
    assert_eq!(suite.title, "Demo Suite");

    let root = pages.root().to_path_buf();
    let outcome = run_suite(
        &registry,
        &suite,
        pages.root(),
        &Session::new(),
        move || -> Box<dyn Browser> { Box::new(FileBrowser::new(&root)) },
        BreakPolicy::Resume,
        |_, _| {},
    );

    assert_eq!(outcome.passed, 2);
    assert_eq!(outcome.failed, 1);
    assert!(outcome.suite_failed());

    assert_eq!(outcome.tests[0].outcome.stop, RunStop::Complete);
    assert!(!outcome.tests[0].outcome.failed);

    // The failing test halted at its assertion; the echo never ran.
    assert!(matches!(
        outcome.tests[1].outcome.stop,
        RunStop::Failed { .. }
    ));
    assert_eq!(outcome.tests[1].outcome.results.len(), 2);
    assert_eq!(
        outcome.tests[1].outcome.results[1].message.as_deref(),
        Some("Actual value 'Home' did not match 'Wrong Title'")
    );

    assert_eq!(outcome.tests[2].outcome.stop, RunStop::Complete);
}

#[test]
fn each_test_starts_from_a_fresh_session_and_browser() {
    let pages = fixture();
    pages
        .write(
            "expects_no_vars.html",
            r#"<table>
                 <tr><td>expects no vars</td></tr>
                 <tr><td>assertExpression</td><td>${t}</td><td>$*</td></tr>
               </table>"#,
        )
        .expect("test");
    pages
        .write(
            "isolation.html",
            r#"<table>
                 <tr><td>Isolation Suite</td></tr>
                 <tr><td><a href="stores.html">Stores</a></td></tr>
                 <tr><td><a href="expects_no_vars.html">No vars</a></td></tr>
               </table>"#,
        )
        .expect("suite");

    let registry = builtin_registry();
    let suite = load_suite(&pages.root().join("isolation.html")).expect("load suite");
    let root = pages.root().to_path_buf();
    let outcome = run_suite(
        &registry,
        &suite,
        pages.root(),
        &Session::new(),
        move || -> Box<dyn Browser> { Box::new(FileBrowser::new(&root)) },
        BreakPolicy::Resume,
        |_, _| {},
    );

    // The variable stored by the first test must not leak into the second.
    assert_eq!(outcome.passed, 2);
    assert_eq!(outcome.failed, 0);
}

#[test]
fn suite_report_round_trips_through_json() {
    let pages = fixture();
    let registry = builtin_registry();
    let suite = load_suite(&pages.root().join("suite.html")).expect("load suite");
    let root = pages.root().to_path_buf();
    let outcome = run_suite(
        &registry,
        &suite,
        pages.root(),
        &Session::new(),
        move || -> Box<dyn Browser> { Box::new(FileBrowser::new(&root)) },
        BreakPolicy::Resume,
        |_, _| {},
    );

    let report_path = pages.root().join("reports/suite.json");
    write_report(&report_path, &SuiteReport::from_outcome(&outcome)).expect("write report");

    let raw = std::fs::read_to_string(&report_path).expect("read report");
    assert!(raw.ends_with('\n'));
    let parsed: serde_json::Value = serde_json::from_str(&raw).expect("parse report");
    assert_eq!(parsed["title"], "Demo Suite");
    assert_eq!(parsed["passed"], 2);
    assert_eq!(parsed["failed"], 1);
    assert_eq!(parsed["tests"].as_array().map(Vec::len), Some(3));
    assert_eq!(parsed["tests"][1]["passed"], false);
    assert_eq!(parsed["tests"][1]["commands"][1]["status"], "failed");
}
