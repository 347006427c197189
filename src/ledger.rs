//! Fact ledger: what the player has confirmed or denied this session.
//!
//! Positive facts pin an attribute to one value; negative facts rule out
//! `(attribute, value)` pairs. A "no" to a boolean question is always stored
//! as the negative fact `(attribute, true)`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::entity::{Answer, AttrValue, ConfirmRule, Question};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactLedger {
    positive: BTreeMap<String, AttrValue>,
    negative: BTreeSet<(String, AttrValue)>,
}

impl FactLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one answered question into the ledger.
    ///
    /// `Unknown` leaves the ledger untouched. A later "yes" on the same
    /// attribute overwrites the earlier positive value.
    pub fn record(&mut self, question: &Question, answer: Answer) {
        let (attr, value) = match question {
            Question::Boolean(a) => (a, AttrValue::Bool(true)),
            Question::Categorical(a, v) => (a, v.clone()),
        };
        match answer {
            Answer::Yes => {
                self.positive.insert(attr.clone(), value);
            }
            Answer::No => {
                self.negative.insert((attr.clone(), value));
            }
            Answer::Unknown => {}
        }
    }

    /// Rebuild a ledger from scratch by folding [`record`](Self::record) over
    /// `entries` in order.
    pub fn replay<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a Question, Answer)>,
    {
        let mut ledger = Self::new();
        for (question, answer) in entries {
            ledger.record(question, answer);
        }
        ledger
    }

    pub fn positive(&self) -> &BTreeMap<String, AttrValue> {
        &self.positive
    }

    pub fn negative(&self) -> &BTreeSet<(String, AttrValue)> {
        &self.negative
    }

    /// Whether `attr` already has a confirmed value.
    pub fn is_pinned(&self, attr: &str) -> bool {
        self.positive.contains_key(attr)
    }

    pub fn denies(&self, attr: &str, value: &AttrValue) -> bool {
        // BTreeSet<(String, _)> cannot be probed with borrowed parts.
        self.negative.iter().any(|(a, v)| a == attr && v == value)
    }

    /// Whether the ledger already decides `rule` one way or the other.
    pub fn settles(&self, rule: &ConfirmRule) -> bool {
        if self.positive.get(&rule.attr) == Some(&rule.value)
            || self.denies(&rule.attr, &rule.value)
        {
            return true;
        }
        // A "no" to a flag answers an expected-false rule.
        rule.value == AttrValue::Bool(false) && self.denies(&rule.attr, &AttrValue::Bool(true))
    }

    pub fn fact_count(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_answers() {
        let mut ledger = FactLedger::new();
        ledger.record(&Question::boolean("zurdo"), Answer::Yes);
        ledger.record(&Question::boolean("balon_oro"), Answer::No);
        ledger.record(&Question::boolean("usa_10"), Answer::Unknown);

        assert_eq!(ledger.positive().get("zurdo"), Some(&AttrValue::Bool(true)));
        assert!(ledger.denies("balon_oro", &AttrValue::Bool(true)));
        assert!(!ledger.is_pinned("usa_10"));
        assert_eq!(ledger.fact_count(), 2);
    }

    #[test]
    fn categorical_negatives_accumulate() {
        let mut ledger = FactLedger::new();
        ledger.record(&Question::categorical("club", "Barcelona"), Answer::No);
        ledger.record(&Question::categorical("club", "Real Madrid"), Answer::No);
        assert_eq!(ledger.negative().len(), 2);
        assert!(!ledger.is_pinned("club"));
    }

    #[test]
    fn later_positive_overwrites() {
        let mut ledger = FactLedger::new();
        ledger.record(&Question::categorical("liga", "LaLiga"), Answer::Yes);
        ledger.record(&Question::categorical("liga", "Serie A"), Answer::Yes);
        assert_eq!(ledger.positive().len(), 1);
        assert_eq!(ledger.positive()["liga"], AttrValue::from("Serie A"));
    }

    #[test]
    fn replay_matches_incremental_recording() {
        let entries = vec![
            (Question::categorical("posicion", "Delantero"), Answer::Yes),
            (Question::boolean("zurdo"), Answer::No),
            (Question::categorical("club", "PSG"), Answer::Unknown),
        ];
        let mut incremental = FactLedger::new();
        for (q, a) in &entries {
            incremental.record(q, *a);
        }
        let replayed = FactLedger::replay(entries.iter().map(|(q, a)| (q, *a)));
        assert_eq!(incremental, replayed);
    }

    #[test]
    fn settles_expected_false_rule_from_denied_flag() {
        let mut ledger = FactLedger::new();
        let rule = ConfirmRule::new("zurdo", false);
        assert!(!ledger.settles(&rule));
        ledger.record(&Question::boolean("zurdo"), Answer::No);
        assert!(ledger.settles(&rule));
    }
}
