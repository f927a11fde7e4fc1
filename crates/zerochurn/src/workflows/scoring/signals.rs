use serde::{Deserialize, Serialize};

/// Explanations accumulated while scoring an account.
///
/// Positive and negative entries explain score movements; notes record data-quality fallbacks
/// that did not move a score. Entries are append-only and keep evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalLog {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub notes: Vec<String>,
}

impl SignalLog {
    pub fn positive(&mut self, signal: impl Into<String>) {
        self.positive.push(signal.into());
    }

    pub fn negative(&mut self, signal: impl Into<String>) {
        self.negative.push(signal.into());
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn append(&mut self, other: SignalLog) {
        self.positive.extend(other.positive);
        self.negative.extend(other.negative);
        self.notes.extend(other.notes);
    }

    /// True when no positive or negative signal was recorded. Notes are ignored.
    pub fn is_quiet(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.positive
            .iter()
            .chain(&self.negative)
            .chain(&self.notes)
            .any(|entry| entry.contains(needle))
    }
}
