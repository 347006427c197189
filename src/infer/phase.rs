//! Phased question ordering for the opening of a game.
//!
//! The first questions are drawn from a small "basic" pool (position,
//! nationality), the next ones from a "context" pool (league), and after that
//! from the whole catalog plus the remaining core attributes. A phase whose
//! pool yields nothing falls through to the next phase in the same call.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::engine::EngineConfig;
use crate::entity::{AttributeCatalog, Entity, Question};
use crate::ledger::FactLedger;

use super::scorer;

/// Which attribute pool a question slot draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Basic,
    Context,
    Open,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Context => write!(f, "context"),
            Self::Open => write!(f, "open"),
        }
    }
}

pub struct PhaseScheduler<'a> {
    config: &'a EngineConfig,
    catalog: &'a AttributeCatalog,
}

impl<'a> PhaseScheduler<'a> {
    pub fn new(config: &'a EngineConfig, catalog: &'a AttributeCatalog) -> Self {
        Self { config, catalog }
    }

    /// The phase a question numbered `question_count` (0-based) starts in.
    pub fn phase_for(&self, question_count: usize) -> Phase {
        let basic = self.config.phase_basic_questions;
        if question_count < basic {
            Phase::Basic
        } else if question_count < basic + self.config.phase_context_questions {
            Phase::Context
        } else {
            Phase::Open
        }
    }

    /// Attributes eligible in `phase`, minus those already used by earlier
    /// phased questions. Order follows configuration; duplicates are dropped.
    pub fn pool(&self, phase: Phase, used: &BTreeSet<String>) -> Vec<String> {
        let candidates: Vec<&str> = match phase {
            Phase::Basic => self.config.basic_pool.iter().map(String::as_str).collect(),
            Phase::Context => self.config.context_pool.iter().map(String::as_str).collect(),
            Phase::Open => {
                let reserved: BTreeSet<&str> = self
                    .config
                    .basic_pool
                    .iter()
                    .chain(&self.config.context_pool)
                    .map(String::as_str)
                    .collect();
                self.catalog
                    .keys()
                    .chain(
                        self.config
                            .core_attributes
                            .iter()
                            .map(String::as_str)
                            .filter(|a| !reserved.contains(a)),
                    )
                    .collect()
            }
        };

        let mut seen = BTreeSet::new();
        candidates
            .into_iter()
            .filter(|a| !used.contains(*a) && seen.insert(*a))
            .map(str::to_string)
            .collect()
    }

    /// Next phased question, or `None` once every remaining pool is exhausted.
    pub fn next_question<R: Rng + ?Sized>(
        &self,
        candidates: &[&Entity],
        ledger: &FactLedger,
        asked: &BTreeSet<Question>,
        question_count: usize,
        used: &BTreeSet<String>,
        rng: &mut R,
    ) -> Option<Question> {
        let start = self.phase_for(question_count);
        let phases = [Phase::Basic, Phase::Context, Phase::Open];

        for phase in phases.into_iter().skip_while(|p| *p != start) {
            let mut pool = self.pool(phase, used);
            pool.shuffle(rng);
            if let Some(q) = scorer::best_from_pool(
                candidates,
                ledger,
                asked,
                &pool,
                self.config.top_k,
                rng,
            ) {
                tracing::trace!(%phase, question = %q, "phased question");
                return Some(q);
            }
        }
        None
    }
}
