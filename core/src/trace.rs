//! Append-only record of an unlock attempt.

use std::fmt;

use serde::Serialize;

use tumbler_types::ProtocolState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Spin,
    Peek,
    Poke,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spin => "spin",
            Self::Peek => "peek",
            Self::Poke => "poke",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One attempted operation.
///
/// Accepted variants are written once per device call; `Rejected` never
/// reaches the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceRecord {
    Spin {
        uniform: bool,
    },
    Peek {
        request: String,
        /// `None` when the device ignored or refused the request.
        reply: Option<String>,
    },
    Poke {
        pattern: String,
    },
    Rejected {
        operation: Operation,
        pattern: Option<String>,
        state: ProtocolState,
        reason: String,
    },
}

impl TraceRecord {
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::Spin { .. } => Operation::Spin,
            Self::Peek { .. } => Operation::Peek,
            Self::Poke { .. } => Operation::Poke,
            Self::Rejected { operation, .. } => *operation,
        }
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spin { uniform } => write!(f, "spin -> {uniform}"),
            Self::Peek {
                request,
                reply: Some(reply),
            } => write!(f, "peek {request} -> {reply}"),
            Self::Peek {
                request,
                reply: None,
            } => write!(f, "peek {request} -> (ignored)"),
            Self::Poke { pattern } => write!(f, "poke {pattern}"),
            Self::Rejected {
                operation,
                pattern,
                state,
                reason,
            } => {
                write!(f, "rejected {operation}")?;
                if let Some(pattern) = pattern {
                    write!(f, " {pattern}")?;
                }
                write!(f, " in {state}: {reason}")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TraceLog {
    records: Vec<TraceRecord>,
}

impl TraceLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: TraceRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that reached the device.
    #[must_use]
    pub fn device_calls(&self) -> usize {
        self.records.iter().filter(|record| !record.is_rejected()).count()
    }

    /// Accepted calls of one kind.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.records
            .iter()
            .filter(|record| !record.is_rejected() && record.operation() == operation)
            .count()
    }

    /// One line per record, oldest first.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&record.to_string());
            out.push('\n');
        }
        out
    }
}
