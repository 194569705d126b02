//! Readable conversation history reconstruction.
//!
//! Interactions store one exchange per row; replaying them for the AI
//! oracle or the sales report means splitting each row into a visitor
//! line and an engine line, dropping sentinel placeholders.

use super::lead::Interaction;

/// Content marker for engine-initiated confirmation prompts.
///
/// Explicit UI actions carry no visitor text; their interactions are
/// persisted with this placeholder and excluded from readable history.
pub const CONFIRMATION_SENTINEL: &str = "[system: request confirmation]";

/// Who produced a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Visitor,
    Engine,
}

/// One line of readable conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryEntry {
    pub fn visitor(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Visitor,
            text: text.into(),
        }
    }

    pub fn engine(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Engine,
            text: text.into(),
        }
    }
}

/// Flattens interactions (ordered oldest-to-newest) into history lines.
///
/// Each interaction yields a visitor line then an engine line. Sentinel
/// placeholders and empty sides are dropped. Only the most recent `limit`
/// lines are kept.
pub fn flatten_history(interactions: &[Interaction], limit: usize) -> Vec<HistoryEntry> {
    let mut lines = Vec::with_capacity(interactions.len() * 2);

    for interaction in interactions {
        let content = interaction.content.trim();
        if !content.is_empty() && content != CONFIRMATION_SENTINEL {
            lines.push(HistoryEntry::visitor(content));
        }
        let outcome = interaction.outcome.trim();
        if !outcome.is_empty() {
            lines.push(HistoryEntry::engine(outcome));
        }
    }

    if lines.len() > limit {
        lines.drain(..lines.len() - limit);
    }
    lines
}
