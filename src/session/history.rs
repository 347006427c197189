//! Append-only answer log and deterministic replay.
//!
//! Undo never rolls state back piecemeal: it truncates the log and rebuilds
//! everything by folding the remaining entries over an empty state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{Answer, Question};
use crate::ledger::FactLedger;

/// One answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: Question,
    pub answer: Answer,
}

/// Everything about a session that is a pure function of its history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub ledger: FactLedger,
    pub asked: BTreeSet<Question>,
    /// Number of answered questions.
    pub question_count: usize,
    /// Attributes of questions asked during the phased opening.
    pub phase_attributes: BTreeSet<String>,
}

impl SessionState {
    /// Apply one answered question. `min_reveal` bounds which positions count
    /// toward `phase_attributes`.
    pub fn apply(&mut self, entry: &HistoryEntry, min_reveal: usize) {
        self.asked.insert(entry.question.clone());
        self.question_count += 1;
        if self.question_count <= min_reveal {
            self.phase_attributes
                .insert(entry.question.attribute().to_string());
        }
        self.ledger.record(&entry.question, entry.answer);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: Question, answer: Answer) {
        self.entries.push(HistoryEntry { question, answer });
    }

    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild session state from an empty start.
    pub fn replay(&self, min_reveal: usize) -> SessionState {
        let mut state = SessionState::default();
        for entry in &self.entries {
            state.apply(entry, min_reveal);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> History {
        let mut history = History::new();
        history.push(Question::categorical("posicion", "Defensa"), Answer::Yes);
        history.push(Question::categorical("nacionalidad", "Italia"), Answer::No);
        history.push(Question::categorical("liga", "Serie A"), Answer::Unknown);
        history.push(Question::boolean("gano_mundial"), Answer::Yes);
        history.push(Question::boolean("zurdo"), Answer::No);
        history
    }

    #[test]
    fn replay_counts_and_phase_window() {
        let state = sample().replay(4);
        assert_eq!(state.question_count, 5);
        assert_eq!(state.asked.len(), 5);
        assert!(state.phase_attributes.contains("gano_mundial"));
        assert!(!state.phase_attributes.contains("zurdo"));
        assert!(state.ledger.is_pinned("posicion"));
        assert!(!state.ledger.is_pinned("liga"));
    }

    #[test]
    fn replay_is_deterministic() {
        let history = sample();
        assert_eq!(history.replay(4), history.replay(4));
    }

    #[test]
    fn pop_then_replay_equals_shorter_history() {
        let mut full = sample();
        full.pop();
        let mut shorter = History::new();
        for entry in sample().entries().iter().take(4) {
            shorter.push(entry.question.clone(), entry.answer);
        }
        assert_eq!(full.replay(4), shorter.replay(4));
    }
}
