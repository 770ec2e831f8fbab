use crate::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mechanism that brought a window to the foreground.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    AttachInput,
    KeySimulation,
    SystemApi,
    PointerClick,
    None,
}

impl StrategyKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::AttachInput => "attach-input",
            StrategyKind::KeySimulation => "key-simulation",
            StrategyKind::SystemApi => "system-api",
            StrategyKind::PointerClick => "pointer-click",
            StrategyKind::None => "none",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one activation call. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationResult {
    pub success: bool,
    pub strategy_used: StrategyKind,
    /// Number of full strategy passes that ran.
    pub attempts_used: u32,
}

impl ActivationResult {
    #[must_use]
    pub fn succeeded(strategy: StrategyKind, attempts: u32) -> Self {
        Self {
            success: true,
            strategy_used: strategy,
            attempts_used: attempts,
        }
    }

    #[must_use]
    pub fn failed(attempts: u32) -> Self {
        Self {
            success: false,
            strategy_used: StrategyKind::None,
            attempts_used: attempts,
        }
    }

    /// Converts a failed result into [`TrackerError::ActivationExhausted`].
    pub fn into_result(self, pid: u32) -> TrackerResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(TrackerError::ActivationExhausted {
                pid,
                attempts: self.attempts_used,
            })
        }
    }
}

/// Which field a search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    Title,
    Process,
}

impl SearchScope {
    /// Case-insensitive substring match of `term` against the scoped field.
    #[must_use]
    pub fn matches(&self, term: &str, title: &str, process_name: &str) -> bool {
        let haystack = match self {
            SearchScope::Title => title,
            SearchScope::Process => process_name,
        };
        haystack.to_lowercase().contains(&term.to_lowercase())
    }
}

impl FromStr for SearchScope {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SearchScope::Title),
            "process" => Ok(SearchScope::Process),
            other => Err(TrackerError::new(format!("unknown search scope '{other}'"))),
        }
    }
}
