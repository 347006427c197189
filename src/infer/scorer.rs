//! Entropy-based question scoring.
//!
//! For every attribute the candidates still disagree on, build the value
//! histogram, measure its Shannon entropy, and turn the attribute into one
//! question:
//!
//! - boolean attributes yield `Boolean(attr)`
//! - categorical attributes yield `Categorical(attr, v)` for the value `v`
//!   whose yes/no split has the smallest worst case `max(count, total - count)`
//!
//! Questions are ranked by entropy, and one of the top `top_k` is picked at
//! random so repeated games over the same data do not replay identically.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::entity::{AttrValue, Entity, Question};
use crate::ledger::FactLedger;

/// A candidate question together with the entropy of its attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredQuestion {
    pub question: Question,
    pub entropy: f64,
}

/// Histogram of `attr` values over the candidates that define it.
pub fn value_counts<'a>(candidates: &[&'a Entity], attr: &str) -> BTreeMap<&'a AttrValue, usize> {
    let mut counts = BTreeMap::new();
    for value in candidates.iter().filter_map(|c| c.get(attr)) {
        *counts.entry(value).or_insert(0) += 1;
    }
    counts
}

/// Shannon entropy in bits of a histogram. Empty histograms score 0.
pub fn entropy<'a, I>(counts: I) -> f64
where
    I: IntoIterator<Item = &'a usize>,
    I::IntoIter: Clone,
{
    let counts = counts.into_iter();
    let total: usize = counts.clone().sum();
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    -counts
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Whether every candidate that defines `attr` holds a boolean for it.
pub fn is_boolean_attr(candidates: &[&Entity], attr: &str) -> bool {
    let mut values = candidates.iter().filter_map(|c| c.get(attr)).peekable();
    values.peek().is_some() && values.all(AttrValue::is_bool)
}

/// Attribute keys present on at least one candidate and not yet pinned.
pub fn open_attributes(candidates: &[&Entity], ledger: &FactLedger) -> BTreeSet<String> {
    candidates
        .iter()
        .flat_map(|c| c.attributes.keys())
        .filter(|k| !ledger.is_pinned(k))
        .cloned()
        .collect()
}

/// Score one attribute, or `None` if it has no unasked question left.
pub fn score_attribute(
    candidates: &[&Entity],
    attr: &str,
    asked: &BTreeSet<Question>,
) -> Option<ScoredQuestion> {
    let counts = value_counts(candidates, attr);
    if counts.is_empty() {
        return None;
    }
    let h = entropy(counts.values());

    if is_boolean_attr(candidates, attr) {
        let question = Question::boolean(attr);
        return (!asked.contains(&question)).then_some(ScoredQuestion {
            question,
            entropy: h,
        });
    }

    let total: usize = counts.values().sum();
    // Values are visited in candidate order; strict `<` keeps the first seen
    // among equal splits.
    let mut seen = BTreeSet::new();
    let mut best: Option<(Question, usize)> = None;
    for value in candidates.iter().filter_map(|c| c.get(attr)) {
        if !seen.insert(value) {
            continue;
        }
        let Some(&count) = counts.get(&value) else {
            continue;
        };
        let question = Question::Categorical(attr.to_string(), value.clone());
        if asked.contains(&question) {
            continue;
        }
        let worst = count.max(total - count);
        if best.as_ref().is_none_or(|(_, w)| worst < *w) {
            best = Some((question, worst));
        }
    }
    best.map(|(question, _)| ScoredQuestion { question, entropy: h })
}

/// Score every attribute in `attrs`, in the given order, dropping exhausted ones.
pub fn rank<'a, I>(candidates: &[&Entity], attrs: I, asked: &BTreeSet<Question>) -> Vec<ScoredQuestion>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut scored: Vec<ScoredQuestion> = attrs
        .into_iter()
        .filter_map(|a| score_attribute(candidates, a, asked))
        .collect();
    // Stable: ties keep the caller's order, so a shuffled pool stays shuffled.
    scored.sort_by(|a, b| b.entropy.total_cmp(&a.entropy));
    scored
}

/// Pick uniformly among the `top_k` highest-entropy questions.
pub fn pick_top_k<R: Rng + ?Sized>(
    scored: &[ScoredQuestion],
    top_k: usize,
    rng: &mut R,
) -> Option<Question> {
    let k = top_k.max(1).min(scored.len());
    scored[..k].choose(rng).map(|s| s.question.clone())
}

/// Best question restricted to `pool`. Pool entries that are pinned or absent
/// from every candidate are ignored.
pub fn best_from_pool<R: Rng + ?Sized>(
    candidates: &[&Entity],
    ledger: &FactLedger,
    asked: &BTreeSet<Question>,
    pool: &[String],
    top_k: usize,
    rng: &mut R,
) -> Option<Question> {
    let present = open_attributes(candidates, ledger);
    let attrs = pool
        .iter()
        .filter(|a| present.contains(a.as_str()))
        .map(String::as_str);
    let scored = rank(candidates, attrs, asked);
    pick_top_k(&scored, top_k, rng)
}

/// Best question over every open attribute of the candidates.
pub fn best_question<R: Rng + ?Sized>(
    candidates: &[&Entity],
    ledger: &FactLedger,
    asked: &BTreeSet<Question>,
    top_k: usize,
    rng: &mut R,
) -> Option<Question> {
    let open = open_attributes(candidates, ledger);
    let scored = rank(candidates, open.iter().map(String::as_str), asked);
    tracing::trace!(scored = scored.len(), "ranked open attributes");
    pick_top_k(&scored, top_k, rng)
}
