//! Switches that push values onto the erased escape paths.
//!
//! Both switches exist so the escape paths can be exercised with ordinary payloads. The
//! process default is read once from the `FACET_BOX_FORCE_ESCAPE` environment variable; a
//! thread can temporarily replace it with [`EscapeConfig::scope`].

use alloc::string::{String, ToString};
use core::cell::Cell;
use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::LazyLock;

use crate::warn_event;

/// Environment variable holding the process-wide default [`EscapeConfig`].
///
/// The value is a comma-separated list of `string`, `record`, `all` or `none`.
pub const FORCE_ESCAPE_ENV: &str = "FACET_BOX_FORCE_ESCAPE";

static PROCESS_DEFAULT: LazyLock<EscapeConfig> = LazyLock::new(|| {
    let config = from_env_value(std::env::var(FORCE_ESCAPE_ENV).ok());
    let state = if config == EscapeConfig::new() {
        DEFAULT_PLAIN
    } else {
        DEFAULT_FORCING
    };
    DEFAULT_STATE.store(state, Ordering::Relaxed);
    config
});

const DEFAULT_UNREAD: u8 = 0;
const DEFAULT_PLAIN: u8 = 1;
const DEFAULT_FORCING: u8 = 2;

/// Mirrors whether [`PROCESS_DEFAULT`] forces anything, once it has been read.
static DEFAULT_STATE: AtomicU8 = AtomicU8::new(DEFAULT_UNREAD);

/// Number of [`EscapeConfig::scope`] calls running on any thread.
static ACTIVE_SCOPES: AtomicUsize = AtomicUsize::new(0);

std::thread_local! {
    static OVERRIDE: Cell<Option<EscapeConfig>> = const { Cell::new(None) };
}

fn from_env_value(raw: Option<String>) -> EscapeConfig {
    let Some(raw) = raw else {
        return EscapeConfig::default();
    };
    match raw.parse::<EscapeConfig>() {
        Ok(config) => config,
        Err(_err) => {
            warn_event!(var = FORCE_ESCAPE_ENV, value = %raw, error = %_err, "ignoring invalid escape config");
            EscapeConfig::default()
        }
    }
}

/// Which values are forced through the erased escape path.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct EscapeConfig {
    /// Box every string and byte buffer through an erased record instead of inline.
    pub force_string_escape: bool,
    /// Box every erased value through a record, never packing the descriptor inline.
    pub force_erased_record: bool,
}

impl EscapeConfig {
    /// No forcing.
    pub const fn new() -> Self {
        Self {
            force_string_escape: false,
            force_erased_record: false,
        }
    }

    /// Sets whether strings and byte buffers are forced onto the escape path.
    pub const fn with_string_escape(mut self, on: bool) -> Self {
        self.force_string_escape = on;
        self
    }

    /// Sets whether erased values are forced onto the record path.
    pub const fn with_erased_record(mut self, on: bool) -> Self {
        self.force_erased_record = on;
        self
    }

    /// The configuration in effect on the current thread.
    ///
    /// With no scope active anywhere and a plain process default, this is two relaxed loads.
    pub fn current() -> Self {
        // A thread inside `scope` has bumped the counter itself, so it never skips its
        // own override.
        if ACTIVE_SCOPES.load(Ordering::Relaxed) == 0
            && DEFAULT_STATE.load(Ordering::Relaxed) == DEFAULT_PLAIN
        {
            return Self::new();
        }
        OVERRIDE
            .try_with(Cell::get)
            .ok()
            .flatten()
            .unwrap_or_else(|| *PROCESS_DEFAULT)
    }

    /// Runs `f` with `self` in effect on the current thread, then restores the previous
    /// configuration, also when `f` panics.
    ///
    /// ```
    /// use facet_box::{Encoding, EscapeConfig, Value};
    ///
    /// let v = EscapeConfig::new()
    ///     .with_string_escape(true)
    ///     .scope(|| Value::string("hello"));
    /// assert_eq!(v.encoding(), Encoding::ErasedRecord);
    /// assert_eq!(v.as_str(), Some("hello"));
    /// ```
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<EscapeConfig>);

        impl Drop for Restore {
            fn drop(&mut self) {
                let previous = self.0;
                let _ = OVERRIDE.try_with(|cell| cell.set(previous));
                ACTIVE_SCOPES.fetch_sub(1, Ordering::Relaxed);
            }
        }

        ACTIVE_SCOPES.fetch_add(1, Ordering::Relaxed);
        let previous = OVERRIDE
            .try_with(|cell| cell.replace(Some(self)))
            .ok()
            .flatten();
        let _restore = Restore(previous);
        f()
    }
}

impl FromStr for EscapeConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut config = EscapeConfig::new();
        for switch in s.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match switch.to_ascii_lowercase().as_str() {
                "string" | "strings" => config.force_string_escape = true,
                "record" | "records" => config.force_erased_record = true,
                "all" => {
                    config.force_string_escape = true;
                    config.force_erased_record = true;
                }
                "none" => {}
                _ => {
                    return Err(ConfigError::new(ConfigErrorKind::UnknownSwitch(
                        switch.to_string(),
                    )));
                }
            }
        }
        Ok(config)
    }
}

/// Error returned when an [`EscapeConfig`] cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The specific kind of error
    pub kind: ConfigErrorKind,
}

impl ConfigError {
    /// Create a new ConfigError
    pub fn new(kind: ConfigErrorKind) -> Self {
        Self { kind }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl core::error::Error for ConfigError {}

/// Specific error kinds for configuration parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A switch name that is not `string`, `record`, `all` or `none`
    UnknownSwitch(String),
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::UnknownSwitch(name) => {
                write!(
                    f,
                    "unknown escape switch `{name}` (expected string, record, all or none)"
                )
            }
        }
    }
}
