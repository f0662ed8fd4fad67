//! The logging contract consumed by the module framework.
//!
//! The core never writes to a sink directly: every unit carries a
//! [`LoggerHandle`], a non-owning reference to a [`Logger`] owned by the
//! host. The default sink forwards into `tracing`; a [`NullLogger`]
//! discards everything.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::anchor::Anchor;
use crate::error::AnchorError;

/// Log severity, from detailed diagnostics up to system-unusable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Notice = 2,
    Warning = 3,
    Error = 4,
    Critical = 5,
    Alert = 6,
    Emergency = 7,
}

impl Level {
    /// Three-letter code used in rendered log lines.
    pub const fn code(self) -> &'static str {
        match self {
            Level::Debug => "DBG",
            Level::Info => "INF",
            Level::Notice => "NTC",
            Level::Warning => "WRN",
            Level::Error => "ERR",
            Level::Critical => "CRT",
            Level::Alert => "ALT",
            Level::Emergency => "EMG",
        }
    }

    /// The filter bit corresponding to this severity.
    pub const fn mask(self) -> LevelFilter {
        LevelFilter::from_bits_truncate(1 << self as u8)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

bitflags! {
    /// Severity mask: one bit per [`Level`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LevelFilter: u8 {
        const DEBUG = 1 << 0;
        const INFO = 1 << 1;
        const NOTICE = 1 << 2;
        const WARNING = 1 << 3;
        const ERROR = 1 << 4;
        const CRITICAL = 1 << 5;
        const ALERT = 1 << 6;
        const EMERGENCY = 1 << 7;
    }
}

impl LevelFilter {
    /// Every severity at `level` or above.
    pub const fn at_least(level: Level) -> Self {
        Self::from_bits_truncate(!0u8 << level as u8)
    }
}

/// A log sink.
///
/// Implementations are owned by the host; the framework reaches them
/// through [`LoggerHandle`] back-references. `sender` is the display name
/// of the unit the message is attributed to.
pub trait Logger: Send + Sync {
    /// Severities this sink accepts.
    fn filter(&self) -> LevelFilter;

    /// True when `level` passes the sink's filter.
    fn enabled(&self, level: Level) -> bool {
        self.filter().contains(level.mask())
    }

    /// Writes one message.
    fn log(&self, sender: &str, level: Level, message: &str);
}

/// Discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn filter(&self) -> LevelFilter {
        LevelFilter::empty()
    }

    fn log(&self, _sender: &str, _level: Level, _message: &str) {}
}

/// Forwards messages into the `tracing` fabric.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    filter: LevelFilter,
}

impl TracingLogger {
    pub fn new(filter: LevelFilter) -> Self {
        Self { filter }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new(LevelFilter::all())
    }
}

impl Logger for TracingLogger {
    fn filter(&self) -> LevelFilter {
        self.filter
    }

    fn log(&self, sender: &str, level: Level, message: &str) {
        match level {
            Level::Debug => {
                tracing::debug!(sender, severity = level.code(), "{message}");
            }
            Level::Info | Level::Notice => {
                tracing::info!(sender, severity = level.code(), "{message}");
            }
            Level::Warning => {
                tracing::warn!(sender, severity = level.code(), "{message}");
            }
            Level::Error | Level::Critical | Level::Alert | Level::Emergency => {
                tracing::error!(sender, severity = level.code(), "{message}");
            }
        }
    }
}

/// Non-owning handle to a [`Logger`].
///
/// Logging through an unbound handle is a silent no-op, so teardown paths
/// never fail on a logger that went away first; [`LoggerHandle::sink`]
/// reports the unbound state for callers that need the sink itself.
#[derive(Debug, Clone, Default)]
pub struct LoggerHandle {
    sink: Anchor<dyn Logger>,
}

impl LoggerHandle {
    /// A handle referring to no sink.
    pub fn unbound() -> Self {
        Self {
            sink: Anchor::unbound(),
        }
    }

    /// A handle referring to `sink`.
    pub fn bound(sink: &Arc<dyn Logger>) -> Self {
        Self {
            sink: Anchor::bound(sink),
        }
    }

    /// True when the handle refers to a live sink.
    pub fn is_bound(&self) -> bool {
        self.sink.is_bound()
    }

    /// The sink itself, failing with [`AnchorError`] when unbound.
    pub fn sink(&self) -> Result<Arc<dyn Logger>, AnchorError> {
        self.sink.get()
    }

    /// Writes one message if a sink is bound and the level passes its
    /// filter.
    pub fn log(&self, sender: &str, level: Level, message: &str) {
        if let Ok(sink) = self.sink.get() {
            if sink.enabled(level) {
                sink.log(sender, level, message);
            }
        }
    }
}
