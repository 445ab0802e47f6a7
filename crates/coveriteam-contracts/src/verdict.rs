//! Verdict classification produced by verifiers and validators.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoveriError;

/// The coarse classification of a tool result.
///
/// Conditions in `ITE` compositions branch on this value, never on the raw
/// result string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultClass {
    /// The property holds.
    True,
    /// The property is violated.
    False,
    /// The tool gave up (timeout, resource limit, incomplete analysis).
    Unknown,
    /// The tool crashed or produced output that could not be interpreted.
    Error,
}

impl ResultClass {
    /// Every class, in declaration order.
    pub const ALL: [ResultClass; 4] = [Self::True, Self::False, Self::Unknown, Self::Error];
}

impl fmt::Display for ResultClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Unknown => "UNKNOWN",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl FromStr for ResultClass {
    type Err = CoveriError;

    /// Accepts `TRUE`, `true`, `RESULT_CLASS_TRUE` and the equivalents for
    /// the other classes. `OTHER` is an alias of `UNKNOWN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("RESULT_CLASS_").unwrap_or(&upper);
        match bare {
            "TRUE" => Ok(Self::True),
            "FALSE" => Ok(Self::False),
            "UNKNOWN" | "OTHER" => Ok(Self::Unknown),
            "ERROR" => Ok(Self::Error),
            _ => Err(CoveriError::evaluation(format!("unknown result class '{s}'"))),
        }
    }
}

/// A verdict: the result class plus the raw result string reported by the tool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Verdict {
    pub class: ResultClass,
    /// Tool-specific result, e.g. `false(unreach-call)` or `TIMEOUT`.
    pub result: String,
}

impl Verdict {
    pub fn new(class: ResultClass, result: impl Into<String>) -> Self {
        Self {
            class,
            result: result.into(),
        }
    }

    /// A verdict whose raw result is the lower-case class name.
    pub fn of(class: ResultClass) -> Self {
        Self::new(class, class.to_string().to_ascii_lowercase())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.class, self.result)
    }
}
