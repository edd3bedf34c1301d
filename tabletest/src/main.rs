//! Table-driven web-test runner CLI.
//!
//! Runs HTML table tests and suites against the bundled file-backed
//! browser, prints a summary, and optionally writes a JSON report.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tabletest::commands::builtin_registry;
use tabletest::core::session::Session;
use tabletest::exit_codes;
use tabletest::io::browser::FileBrowser;
use tabletest::io::config::{HarnessConfig, load_config, write_config};
use tabletest::io::report::{SuiteReport, TestReport, write_report};
use tabletest::io::suite::{load_suite, looks_like_suite};
use tabletest::io::table::load_test;
use tabletest::looping::{BreakPolicy, run_test};
use tabletest::step::CommandStatus;
use tabletest::suite_run::run_suite;

#[derive(Parser)]
#[command(name = "tabletest", version, about = "Table-driven web-test runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a test or suite file.
    Run {
        /// Test or suite HTML file.
        path: PathBuf,
        /// Page root the file browser serves from; defaults to the input
        /// file's directory.
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Inter-command delay in milliseconds; negative single-steps.
        #[arg(long, allow_negative_numbers = true)]
        speed_ms: Option<i64>,
        /// Wait deadline in milliseconds for AndWait/waitFor conditions.
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Config file (TOML); missing file means defaults.
        #[arg(long, default_value = "tabletest.toml")]
        config: PathBuf,
        /// Write a JSON report here.
        #[arg(long)]
        report: Option<PathBuf>,
        /// What to do at breakpoint rows.
        #[arg(long, value_enum, default_value_t = Breakpoints::Resume)]
        breakpoints: Breakpoints,
        /// Treat the input as a suite even if it does not look like one.
        #[arg(long)]
        suite: bool,
    },
    /// Parse a test or suite file and report problems without running it.
    Check {
        /// Test or suite HTML file.
        path: PathBuf,
    },
    /// Write a default config file if missing.
    Init {
        /// Where to write the config.
        #[arg(long, default_value = "tabletest.toml")]
        config: PathBuf,
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// List all registered command names.
    Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Breakpoints {
    /// Log and continue past breakpoints.
    Resume,
    /// Stop the run at the first breakpoint.
    Stop,
}

impl From<Breakpoints> for BreakPolicy {
    fn from(b: Breakpoints) -> Self {
        match b {
            Breakpoints::Resume => BreakPolicy::Resume,
            Breakpoints::Stop => BreakPolicy::Stop,
        }
    }
}

fn main() -> ExitCode {
    tabletest::logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_codes::INVALID)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    match cli.command {
        Command::Run {
            path,
            base_dir,
            speed_ms,
            timeout_ms,
            config,
            report,
            breakpoints,
            suite,
        } => cmd_run(
            &path,
            base_dir.as_deref(),
            speed_ms,
            timeout_ms,
            &config,
            report.as_deref(),
            breakpoints.into(),
            suite,
        ),
        Command::Check { path } => cmd_check(&path),
        Command::Init { config, force } => cmd_init(&config, force),
        Command::Commands => cmd_commands(),
    }
}

#[expect(clippy::too_many_arguments)]
fn cmd_run(
    path: &Path,
    base_dir: Option<&Path>,
    speed_ms: Option<i64>,
    timeout_ms: Option<u64>,
    config_path: &Path,
    report: Option<&Path>,
    break_policy: BreakPolicy,
    force_suite: bool,
) -> Result<u8> {
    let mut config = load_config(config_path)?;
    if let Some(speed_ms) = speed_ms {
        config.speed_ms = speed_ms;
    }
    if let Some(timeout_ms) = timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.validate()?;
    let session = config.session();

    let input_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let page_root = base_dir.map(Path::to_path_buf).unwrap_or(input_dir.clone());

    let registry = builtin_registry();
    let html =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;

    if force_suite || looks_like_suite(&html) {
        run_suite_file(
            &registry,
            path,
            &input_dir,
            &page_root,
            &session,
            break_policy,
            report,
        )
    } else {
        run_test_file(&registry, path, &page_root, session, break_policy, report)
    }
}

fn run_suite_file(
    registry: &tabletest::core::registry::Registry,
    path: &Path,
    suite_dir: &Path,
    page_root: &Path,
    session: &Session,
    break_policy: BreakPolicy,
    report: Option<&Path>,
) -> Result<u8> {
    let suite = load_suite(path)?;
    info!(suite = %suite.title, tests = suite.tests.len(), "running suite");

    let root = page_root.to_path_buf();
    let outcome = run_suite(
        registry,
        &suite,
        suite_dir,
        session,
        move || -> Box<dyn tabletest::core::browser::Browser> {
            Box::new(FileBrowser::new(&root))
        },
        break_policy,
        |test, result| print_command_line(Some(test), result),
    );

    println!(
        "suite '{}': {} passed, {} failed",
        outcome.title, outcome.passed, outcome.failed
    );
    if let Some(report_path) = report {
        write_report(report_path, &SuiteReport::from_outcome(&outcome))?;
    }
    Ok(if outcome.suite_failed() {
        exit_codes::FAILED
    } else {
        exit_codes::OK
    })
}

fn run_test_file(
    registry: &tabletest::core::registry::Registry,
    path: &Path,
    page_root: &Path,
    session: Session,
    break_policy: BreakPolicy,
    report: Option<&Path>,
) -> Result<u8> {
    let test = load_test(path)?;
    info!(test = %test.title, commands = test.commands.len(), "running test");

    let mut browser = FileBrowser::new(page_root);
    let outcome = run_test(registry, &test, session, &mut browser, break_policy, |result| {
        print_command_line(None, result);
    });

    println!(
        "test '{}': {}",
        outcome.title,
        if outcome.failed { "FAILED" } else { "passed" }
    );
    if let Some(report_path) = report {
        write_report(report_path, &TestReport::from_outcome(&outcome))?;
    }
    Ok(if outcome.failed {
        exit_codes::FAILED
    } else {
        exit_codes::OK
    })
}

fn print_command_line(test: Option<&str>, result: &tabletest::step::CommandResult) {
    let status = match result.status {
        CommandStatus::Passed => "ok",
        CommandStatus::Failed => "FAIL",
        CommandStatus::Error => "ERROR",
    };
    let prefix = test.map(|t| format!("[{t}] ")).unwrap_or_default();
    match &result.message {
        Some(message) => println!("{prefix}{status:5} {}: {message}", result.command.name),
        None => println!("{prefix}{status:5} {}", result.command.name),
    }
}

fn cmd_check(path: &Path) -> Result<u8> {
    let html =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let registry = builtin_registry();

    if looks_like_suite(&html) {
        let suite = load_suite(path)?;
        let suite_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut unknown = Vec::new();
        for entry in &suite.tests {
            let test = load_test(&suite_dir.join(&entry.href))?;
            unknown.extend(unknown_commands(&registry, &test));
        }
        if !unknown.is_empty() {
            anyhow::bail!("unknown commands: {}", unknown.join(", "));
        }
        println!("suite '{}': {} tests", suite.title, suite.tests.len());
        return Ok(exit_codes::OK);
    }

    let test = load_test(path)?;
    let unknown = unknown_commands(&registry, &test);
    if !unknown.is_empty() {
        anyhow::bail!("unknown commands: {}", unknown.join(", "));
    }
    println!("test '{}': {} commands", test.title, test.commands.len());
    Ok(exit_codes::OK)
}

fn unknown_commands(
    registry: &tabletest::core::registry::Registry,
    test: &tabletest::io::table::TestCase,
) -> Vec<String> {
    test.commands
        .iter()
        .filter(|command| !registry.contains(&command.name))
        .map(|command| command.name.clone())
        .collect()
}

fn cmd_init(config_path: &Path, force: bool) -> Result<u8> {
    if !force && config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(exit_codes::OK);
    }
    write_config(config_path, &HarnessConfig::default())?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

fn cmd_commands() -> Result<u8> {
    let registry = builtin_registry();
    for name in registry.names() {
        println!("{name}");
    }
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabletest::test_support::PageDir;

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::parse_from(["tabletest", "run", "smoke.html"]);
        match cli.command {
            Command::Run {
                path,
                breakpoints,
                suite,
                config,
                ..
            } => {
                assert_eq!(path, PathBuf::from("smoke.html"));
                assert_eq!(breakpoints, Breakpoints::Resume);
                assert!(!suite);
                assert_eq!(config, PathBuf::from("tabletest.toml"));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parse_run_flags() {
        let cli = Cli::parse_from([
            "tabletest",
            "run",
            "suite.html",
            "--suite",
            "--speed-ms",
            "-250",
            "--breakpoints",
            "stop",
            "--report",
            "out/run.json",
        ]);
        match cli.command {
            Command::Run {
                speed_ms,
                breakpoints,
                suite,
                report,
                ..
            } => {
                assert_eq!(speed_ms, Some(-250));
                assert_eq!(breakpoints, Breakpoints::Stop);
                assert!(suite);
                assert_eq!(report, Some(PathBuf::from("out/run.json")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parse_check_and_commands() {
        let cli = Cli::parse_from(["tabletest", "check", "t.html"]);
        assert!(matches!(cli.command, Command::Check { .. }));
        let cli = Cli::parse_from(["tabletest", "commands"]);
        assert!(matches!(cli.command, Command::Commands));
    }

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["tabletest", "init", "--force"]);
        match cli.command {
            Command::Init { config, force } => {
                assert_eq!(config, PathBuf::from("tabletest.toml"));
                assert!(force);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn check_accepts_a_clean_test_file() {
        let pages = PageDir::new().expect("page dir");
        pages
            .write(
                "ok.html",
                "<table><tr><td>ok</td></tr><tr><td>echo</td><td>hi</td><td></td></tr></table>",
            )
            .expect("write test");
        let code = cmd_check(&pages.root().join("ok.html")).expect("check");
        assert_eq!(code, exit_codes::OK);
    }

    #[test]
    fn check_lists_unknown_command_names() {
        let pages = PageDir::new().expect("page dir");
        pages
            .write(
                "typo.html",
                "<table><tr><td>typo</td></tr>\
                 <tr><td>clack</td><td>id=b</td><td></td></tr>\
                 <tr><td>typw</td><td>id=q</td><td>x</td></tr></table>",
            )
            .expect("write test");
        let err = cmd_check(&pages.root().join("typo.html")).unwrap_err();
        assert_eq!(err.to_string(), "unknown commands: clack, typw");
    }

    #[test]
    fn check_scans_every_test_of_a_suite() {
        let pages = PageDir::new().expect("page dir");
        pages
            .write(
                "ok.html",
                "<table><tr><td>ok</td></tr><tr><td>echo</td><td>hi</td><td></td></tr></table>",
            )
            .expect("write ok");
        pages
            .write(
                "typo.html",
                "<table><tr><td>typo</td></tr><tr><td>clack</td><td>id=b</td><td></td></tr></table>",
            )
            .expect("write typo");
        pages
            .write(
                "suite.html",
                r#"<table>
                     <tr><td>Check Suite</td></tr>
                     <tr><td><a href="ok.html">ok</a></td></tr>
                     <tr><td><a href="typo.html">typo</a></td></tr>
                   </table>"#,
            )
            .expect("write suite");

        let err = cmd_check(&pages.root().join("suite.html")).unwrap_err();
        assert_eq!(err.to_string(), "unknown commands: clack");

        pages
            .write(
                "clean.html",
                r#"<table>
                     <tr><td>Clean Suite</td></tr>
                     <tr><td><a href="ok.html">ok</a></td></tr>
                   </table>"#,
            )
            .expect("write clean suite");
        let code = cmd_check(&pages.root().join("clean.html")).expect("check");
        assert_eq!(code, exit_codes::OK);
    }

    #[test]
    fn init_writes_a_loadable_default_config() {
        let pages = PageDir::new().expect("page dir");
        let path = pages.root().join("tabletest.toml");

        let code = cmd_init(&path, false).expect("init");
        assert_eq!(code, exit_codes::OK);
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg, HarnessConfig::default());

        // A second init leaves an existing file alone unless forced.
        std::fs::write(&path, "speed_ms = 42\n").expect("overwrite");
        cmd_init(&path, false).expect("init again");
        assert_eq!(load_config(&path).expect("load").speed_ms, 42);
        cmd_init(&path, true).expect("forced init");
        assert_eq!(load_config(&path).expect("load"), HarnessConfig::default());
    }
}
