//! Parallel-edge policies.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How relationships sharing `(source, target)` are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Aggregation {
    /// Parallel relationships are a contract violation.
    None,
    /// Weights are added.
    Sum,
    /// The smallest weight is kept.
    Min,
    /// The largest weight is kept.
    Max,
    /// The first imported relationship is kept.
    #[default]
    Single,
}

impl Aggregation {
    /// All policies, in declaration order.
    pub const ALL: [Aggregation; 5] = [
        Aggregation::None,
        Aggregation::Sum,
        Aggregation::Min,
        Aggregation::Max,
        Aggregation::Single,
    ];

    /// Folds `incoming` into `existing` for the relationship `source -> target`.
    #[inline]
    pub fn merge(self, existing: &mut f64, incoming: f64, source: u64, target: u64) -> Result<()> {
        match self {
            Aggregation::None => {
                return Err(Error::DuplicateRelationship {
                    source_node: source,
                    target_node: target,
                })
            }
            Aggregation::Sum => *existing += incoming,
            Aggregation::Min => *existing = existing.min(incoming),
            Aggregation::Max => *existing = existing.max(incoming),
            Aggregation::Single => {}
        }
        Ok(())
    }

    /// Upper-case name as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Aggregation::None => "NONE",
            Aggregation::Sum => "SUM",
            Aggregation::Min => "MIN",
            Aggregation::Max => "MAX",
            Aggregation::Single => "SINGLE",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Aggregation::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidProperty(format!("unknown aggregation '{s}'")))
    }
}
