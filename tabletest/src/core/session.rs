//! Per-run mutable state: stored variables, pacing, timeout, abort flag.
//!
//! All loop state lives here instead of in process globals, so a run owns
//! its session outright and two runs never interfere.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default wait timeout for `AndWait` and `waitFor*` conditions.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Cooperative cancellation handle for a run.
///
/// The loop checks the flag before selecting each command; an in-flight
/// command is never preempted.
#[derive(Debug, Clone)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Mutable execution state owned by one run.
#[derive(Debug, Clone)]
pub struct Session {
    vars: BTreeMap<String, String>,
    speed_ms: i64,
    pause_once: Option<Duration>,
    timeout: Duration,
    abort: Arc<AtomicBool>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            vars: BTreeMap::new(),
            speed_ms: 0,
            pause_once: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            abort: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a variable; later `${name}` references substitute this value.
    pub fn set_var(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Inter-command delay in milliseconds. Negative means "pause before
    /// every command" (single-step mode).
    pub fn speed_ms(&self) -> i64 {
        self.speed_ms
    }

    pub fn set_speed_ms(&mut self, speed_ms: i64) {
        self.speed_ms = speed_ms;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Request a one-shot delay before the next command; takes precedence
    /// over the configured speed and is consumed once.
    pub fn request_pause(&mut self, interval: Duration) {
        self.pause_once = Some(interval);
    }

    pub fn take_pause_once(&mut self) -> Option<Duration> {
        self.pause_once.take()
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle(Arc::clone(&self.abort))
    }

    pub fn aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}
