//! Confirmation gate: leading-candidate probability and entity-specific checks.
//!
//! Each candidate scores one point per positive ledger fact it matches. The
//! leader's probability uses Laplace smoothing over all candidates:
//!
//! ```text
//! p = (top + 1) / Σ (score_i + 1)
//! ```
//!
//! Once `p` reaches the configured threshold, the leader's first unresolved
//! confirmation rule is asked before the guess is shown.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entity::{Answer, AttrValue, AttributeCatalog, Entity, Question};
use crate::ledger::FactLedger;
use crate::text::question_text;

/// Number of positive ledger facts `entity` matches.
pub fn match_score(entity: &Entity, ledger: &FactLedger) -> usize {
    ledger
        .positive()
        .iter()
        .filter(|(k, v)| entity.get(k) == Some(*v))
        .count()
}

/// The leading candidate and how confident the gate is in it.
#[derive(Debug, Clone, Copy)]
pub struct Assessment<'a> {
    pub leader: &'a Entity,
    pub probability: f64,
    pub raw_score: usize,
}

/// Rank candidates by match score and compute the leader's probability.
/// Returns `None` for an empty candidate set.
pub fn evaluate<'a>(candidates: &[&'a Entity], ledger: &FactLedger) -> Option<Assessment<'a>> {
    let mut scored: Vec<(&Entity, usize)> = candidates
        .iter()
        .map(|c| (*c, match_score(c, ledger)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let &(leader, raw_score) = scored.first()?;
    let smoothed_sum: usize = scored.iter().map(|(_, s)| s + 1).sum();
    Some(Assessment {
        leader,
        probability: (raw_score + 1) as f64 / smoothed_sum as f64,
        raw_score,
    })
}

/// An entity-specific question currently awaiting an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub entity: String,
    pub question: Question,
    pub expected: AttrValue,
    pub text: String,
}

impl PendingConfirmation {
    /// Whether `answer` confirms the entity.
    ///
    /// Categorical checks need a "yes"; boolean checks need the answer to
    /// match the expected flag.
    pub fn is_confirmed_by(&self, answer: Answer) -> bool {
        match (&self.question, &self.expected) {
            (Question::Boolean(_), AttrValue::Bool(true)) => answer == Answer::Yes,
            (Question::Boolean(_), AttrValue::Bool(false)) => answer == Answer::No,
            _ => answer == Answer::Yes,
        }
    }
}

/// First confirmation rule of `entity` that the ledger has not settled and
/// whose question has not been asked yet.
pub fn next_confirmation(
    entity: &Entity,
    ledger: &FactLedger,
    asked: &BTreeSet<Question>,
    catalog: &AttributeCatalog,
) -> Option<PendingConfirmation> {
    entity
        .confirm
        .iter()
        .filter(|rule| !ledger.settles(rule))
        .map(|rule| (rule, rule.as_question()))
        .find(|(_, q)| !asked.contains(q))
        .map(|(rule, question)| PendingConfirmation {
            entity: entity.name.clone(),
            text: rule
                .question
                .clone()
                .unwrap_or_else(|| question_text(&question, catalog)),
            expected: rule.value.clone(),
            question,
        })
}
