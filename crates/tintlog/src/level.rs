use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU8, Ordering},
    },
};

use anyhow::{Error, bail};
use itertools::Itertools;

/// Severity of a log line, ordered from the most verbose to the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Notice,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Every severity, in priority order.
    pub const ALL: [Self; 6] =
        [Self::Debug, Self::Info, Self::Notice, Self::Warn, Self::Error, Self::Fatal];

    pub const fn priority(self) -> u8 {
        match self {
            Self::Debug => 0,
            Self::Info => 1,
            Self::Notice => 2,
            Self::Warn => 3,
            Self::Error => 4,
            Self::Fatal => 5,
        }
    }

    /// The display name, also used to select a level by name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Info => "Info",
            Self::Notice => "Notice",
            Self::Warn => "Warn",
            Self::Error => "Error",
            Self::Fatal => "Fatal",
        }
    }

    /// Exact, case-sensitive lookup of a display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|severity| severity.name() == name)
    }

    pub fn from_priority(priority: u8) -> Option<Self> {
        Self::ALL.get(usize::from(priority)).copied()
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_name(s) {
            Some(severity) => Ok(severity),
            None => bail!("Unknown severity `{s}`, expected one of: {}", Self::ALL.iter().join(", ")),
        }
    }
}

/// Minimum severity a logger lets through.
#[derive(Debug)]
pub struct Threshold(AtomicU8);

impl Threshold {
    pub const fn new(min: Severity) -> Self {
        Self(AtomicU8::new(min.priority()))
    }

    pub fn get(&self) -> Severity {
        Severity::from_priority(self.0.load(Ordering::Relaxed)).unwrap_or(Severity::Debug)
    }

    pub fn set(&self, min: Severity) {
        self.0.store(min.priority(), Ordering::Relaxed);
    }

    /// Selects the threshold by display name.
    ///
    /// Names that match no severity lower the threshold to [`Severity::Debug`],
    /// so a typo in configuration logs everything instead of nothing.
    pub fn set_by_name(&self, name: &str) -> Severity {
        let min = Severity::from_name(name).unwrap_or(Severity::Debug);
        self.set(min);
        min
    }

    pub fn allows(&self, severity: Severity) -> bool {
        severity.priority() >= self.0.load(Ordering::Relaxed)
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::new(Severity::Debug)
    }
}

static GLOBAL_THRESHOLD: LazyLock<Arc<Threshold>> = LazyLock::new(Arc::default);

/// The process-wide threshold shared by loggers that don't own one.
pub fn global_threshold() -> Arc<Threshold> {
    Arc::clone(&GLOBAL_THRESHOLD)
}

/// Sets the process-wide threshold by display name, see [`Threshold::set_by_name`].
pub fn set_min_level(name: &str) -> Severity {
    GLOBAL_THRESHOLD.set_by_name(name)
}

#[cfg(test)]
mod tests {
    use super::{Severity, Threshold};

    #[test]
    fn priorities_follow_declaration_order() {
        for (priority, severity) in Severity::ALL.into_iter().enumerate() {
            assert_eq!(usize::from(severity.priority()), priority);
            assert_eq!(Severity::from_priority(severity.priority()), Some(severity));
        }
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Error < Severity::Fatal);
        assert_eq!(Severity::from_priority(6), None);
    }

    #[test]
    fn lookup_is_exact() -> anyhow::Result<()> {
        assert_eq!(Severity::from_name("Notice"), Some(Severity::Notice));
        assert_eq!(Severity::from_name("notice"), None);
        assert_eq!("Warn".parse::<Severity>()?, Severity::Warn);

        let err = "WARN".parse::<Severity>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown severity `WARN`, expected one of: Debug, Info, Notice, Warn, Error, Fatal"
        );
        Ok(())
    }

    #[test]
    fn unknown_name_logs_everything() {
        let threshold = Threshold::new(Severity::Error);
        assert!(!threshold.allows(Severity::Debug));

        assert_eq!(threshold.set_by_name("verbose"), Severity::Debug);
        assert!(threshold.allows(Severity::Debug));
    }

    #[test]
    fn threshold_is_inclusive() {
        let threshold = Threshold::default();
        threshold.set_by_name("Warn");

        assert_eq!(threshold.get(), Severity::Warn);
        assert!(!threshold.allows(Severity::Notice));
        assert!(threshold.allows(Severity::Warn));
        assert!(threshold.allows(Severity::Fatal));
    }
}
