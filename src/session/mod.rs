//! Game session: the question/answer state machine.
//!
//! A session is driven one call at a time by its host:
//!
//! - [`Session::next`] returns the outstanding step, computing one if needed
//! - [`Session::answer`] records a response and moves on
//! - [`Session::undo`] drops the last answer and replays the rest
//!
//! Every call is synchronous. A session is a single mutable value; hosts that
//! serve several games keep one session per game.
//!
//! Each time a new step is needed the machine runs, in order:
//!
//! 1. filter candidates; none left → [`Step::NoMatch`]
//! 2. below the reveal threshold → phased question
//! 3. one candidate → certain result
//! 4. pending confirmation → ask it again
//! 5. two leaders with a discriminating attribute → ask it
//! 6. leader probability over threshold → confirmation question, or an
//!    uncertain result if the leader has no unresolved rule
//! 7. best entropy question
//! 8. nothing left to ask → uncertain result for the leader

pub mod history;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::engine::EngineConfig;
use crate::entity::{Answer, AttributeCatalog, Entity, Question};
use crate::error::SessionError;
use crate::infer::confirm::{self, PendingConfirmation};
use crate::infer::discriminate::{discriminate, top_two};
use crate::infer::filter::filter_candidates;
use crate::infer::phase::PhaseScheduler;
use crate::infer::scorer;
use crate::text::question_text;

pub use history::{History, HistoryEntry, SessionState};

/// What the host should show next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    /// Ask the player a yes/no/unknown question.
    Ask { text: String, question: Question },
    /// Present a guess. `certain` is false for best-effort guesses.
    Result { name: String, certain: bool },
    /// No entity is consistent with the answers.
    NoMatch,
    /// `undo` was called with an empty history.
    NothingToUndo,
}

/// Where the state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    AskingPhased,
    AskingDiscriminative,
    AwaitingConfirmation,
    AskingEntropy,
    Result,
    NoMatch,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AskingPhased => write!(f, "asking-phased"),
            Self::AskingDiscriminative => write!(f, "asking-discriminative"),
            Self::AwaitingConfirmation => write!(f, "awaiting-confirmation"),
            Self::AskingEntropy => write!(f, "asking-entropy"),
            Self::Result => write!(f, "result"),
            Self::NoMatch => write!(f, "no-match"),
        }
    }
}

pub struct Session {
    config: Arc<EngineConfig>,
    entities: Arc<[Entity]>,
    catalog: Arc<AttributeCatalog>,
    rng: StdRng,

    state: SessionState,
    history: History,
    pending: Option<PendingConfirmation>,
    /// Question awaiting an answer, if any.
    current: Option<Question>,
    /// Last step handed out; `next` returns it unchanged until state moves.
    outcome: Option<Step>,
    phase: SessionPhase,
}

impl Session {
    /// Start a session. The RNG is seeded from `config.seed`, or from OS
    /// entropy when unset.
    pub fn new(entities: Vec<Entity>, catalog: AttributeCatalog, config: Arc<EngineConfig>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(entities, catalog, config, rng)
    }

    /// Start a session with an explicit random source for tie-breaks.
    pub fn with_rng(
        entities: Vec<Entity>,
        catalog: AttributeCatalog,
        config: Arc<EngineConfig>,
        rng: StdRng,
    ) -> Self {
        let mut session = Self {
            config,
            entities: Arc::from(Vec::new()),
            catalog: Arc::new(AttributeCatalog::new()),
            rng,
            state: SessionState::default(),
            history: History::new(),
            pending: None,
            current: None,
            outcome: None,
            phase: SessionPhase::AskingPhased,
        };
        session.start(entities, catalog);
        session
    }

    /// Discard all session state and begin a new game over `entities`.
    ///
    /// The catalog is captured as-is; later catalog changes only reach a
    /// session through another `start`.
    pub fn start(&mut self, entities: Vec<Entity>, catalog: AttributeCatalog) {
        tracing::info!(
            entities = entities.len(),
            catalog_version = catalog.version,
            "starting session"
        );
        self.entities = Arc::from(entities);
        self.catalog = Arc::new(catalog);
        self.state = SessionState::default();
        self.history = History::new();
        self.pending = None;
        self.current = None;
        self.outcome = None;
        self.phase = SessionPhase::AskingPhased;
    }

    /// The outstanding step, computing a new one if nothing is outstanding.
    pub fn next(&mut self) -> Step {
        if let Some(step) = &self.outcome {
            return step.clone();
        }
        self.advance()
    }

    /// Record `answer` to the outstanding question and return the next step.
    pub fn answer(&mut self, answer: Answer) -> Result<Step, SessionError> {
        let Some(question) = self.current.take() else {
            return Err(SessionError::InvalidState {
                message: "no question is awaiting an answer".into(),
            });
        };
        tracing::debug!(%question, ?answer, "answer recorded");

        let entry = HistoryEntry { question, answer };
        self.state.apply(&entry, self.config.min_reveal_questions);
        self.history.push(entry.question, entry.answer);
        self.outcome = None;

        match self.pending.take() {
            Some(pending) if pending.is_confirmed_by(answer) => {
                Ok(self.conclude(pending.entity, true))
            }
            _ => Ok(self.advance()),
        }
    }

    /// Drop the last answer and rebuild state by replaying the rest.
    pub fn undo(&mut self) -> Step {
        if self.history.pop().is_none() {
            return Step::NothingToUndo;
        }
        self.state = self.history.replay(self.config.min_reveal_questions);
        self.pending = None;
        self.current = None;
        self.outcome = None;
        tracing::debug!(remaining = self.history.len(), "undo replayed history");
        self.advance()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Replayable state: ledger, asked set, counters.
    pub fn snapshot(&self) -> &SessionState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn pending_confirmation(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn catalog_version(&self) -> u64 {
        self.catalog.version
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities consistent with the answers so far.
    pub fn candidates(&self) -> Vec<&Entity> {
        filter_candidates(&self.entities, &self.state.ledger)
    }

    // -----------------------------------------------------------------------
    // State machine
    // -----------------------------------------------------------------------

    fn advance(&mut self) -> Step {
        let entities = Arc::clone(&self.entities);
        let catalog = Arc::clone(&self.catalog);
        let config = Arc::clone(&self.config);
        let candidates = filter_candidates(&entities, &self.state.ledger);

        if candidates.is_empty() {
            self.pending = None;
            self.current = None;
            return self.settle(SessionPhase::NoMatch, Step::NoMatch);
        }

        if self.state.question_count < config.min_reveal_questions {
            let scheduler = PhaseScheduler::new(&config, &catalog);
            if let Some(q) = scheduler.next_question(
                &candidates,
                &self.state.ledger,
                &self.state.asked,
                self.state.question_count,
                &self.state.phase_attributes,
                &mut self.rng,
            ) {
                return self.ask(SessionPhase::AskingPhased, q, None, candidates.len());
            }
        }

        if let [only] = candidates.as_slice() {
            return self.conclude(only.name.clone(), true);
        }

        if let Some(pending) = &self.pending {
            let (question, text) = (pending.question.clone(), pending.text.clone());
            return self.ask(
                SessionPhase::AwaitingConfirmation,
                question,
                Some(text),
                candidates.len(),
            );
        }

        let leaders = top_two(&candidates, &self.state.ledger);
        if let [first, second] = leaders.as_slice() {
            let discriminator = discriminate(
                first,
                second,
                &self.state.ledger,
                &self.state.asked,
                &config.discriminator_order,
            );
            if let Some(q) = discriminator {
                return self.ask(SessionPhase::AskingDiscriminative, q, None, candidates.len());
            }
        }

        let assessment = confirm::evaluate(&candidates, &self.state.ledger);
        if let Some(lead) = assessment.filter(|a| a.probability >= config.confirm_probability) {
            tracing::debug!(
                leader = %lead.leader.name,
                probability = lead.probability,
                raw_score = lead.raw_score,
                "confidence threshold reached"
            );
            return match confirm::next_confirmation(
                lead.leader,
                &self.state.ledger,
                &self.state.asked,
                &catalog,
            ) {
                Some(pending) => {
                    let (question, text) = (pending.question.clone(), pending.text.clone());
                    self.pending = Some(pending);
                    self.ask(
                        SessionPhase::AwaitingConfirmation,
                        question,
                        Some(text),
                        candidates.len(),
                    )
                }
                None => self.conclude(lead.leader.name.clone(), false),
            };
        }

        if let Some(q) = scorer::best_question(
            &candidates,
            &self.state.ledger,
            &self.state.asked,
            config.top_k,
            &mut self.rng,
        ) {
            return self.ask(SessionPhase::AskingEntropy, q, None, candidates.len());
        }

        match assessment {
            Some(lead) => self.conclude(lead.leader.name.clone(), false),
            None => self.settle(SessionPhase::NoMatch, Step::NoMatch),
        }
    }

    fn ask(
        &mut self,
        phase: SessionPhase,
        question: Question,
        text: Option<String>,
        candidates: usize,
    ) -> Step {
        tracing::debug!(%phase, %question, candidates, "asking");
        let text = text.unwrap_or_else(|| question_text(&question, &self.catalog));
        self.current = Some(question.clone());
        self.settle(phase, Step::Ask { text, question })
    }

    fn conclude(&mut self, name: String, certain: bool) -> Step {
        tracing::info!(%name, certain, answers = self.history.len(), "presenting result");
        self.current = None;
        self.settle(SessionPhase::Result, Step::Result { name, certain })
    }

    fn settle(&mut self, phase: SessionPhase, step: Step) -> Step {
        self.phase = phase;
        self.outcome = Some(step.clone());
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ConfirmRule;

    fn config() -> Arc<EngineConfig> {
        Arc::new(EngineConfig {
            seed: Some(42),
            ..Default::default()
        })
    }

    fn roster() -> Vec<Entity> {
        vec![
            Entity::new("Messi")
                .with("posicion", "Delantero")
                .with("nacionalidad", "Argentina")
                .with("liga", "MLS")
                .with("zurdo", true),
            Entity::new("Modric")
                .with("posicion", "Medio")
                .with("nacionalidad", "Croacia")
                .with("liga", "LaLiga")
                .with("zurdo", false),
            Entity::new("Neuer")
                .with("posicion", "Portero")
                .with("nacionalidad", "Alemania")
                .with("liga", "Bundesliga")
                .with("zurdo", false),
        ]
    }

    #[test]
    fn next_is_idempotent_until_answered() {
        let mut session = Session::new(roster(), AttributeCatalog::builtin(), config());
        let first = session.next();
        assert!(matches!(first, Step::Ask { .. }));
        assert_eq!(session.next(), first);
        assert_eq!(session.phase(), SessionPhase::AskingPhased);
        assert!(session.snapshot().asked.is_empty());
    }

    #[test]
    fn answer_without_question_is_invalid_state() {
        let mut session = Session::new(roster(), AttributeCatalog::builtin(), config());
        let err = session.answer(Answer::Yes).unwrap_err();
        assert!(matches!(err, SessionError::InvalidState { .. }));
    }

    #[test]
    fn empty_roster_is_no_match() {
        let mut session = Session::new(Vec::new(), AttributeCatalog::builtin(), config());
        assert_eq!(session.next(), Step::NoMatch);
        assert_eq!(session.phase(), SessionPhase::NoMatch);
    }

    #[test]
    fn undo_on_empty_history() {
        let mut session = Session::new(roster(), AttributeCatalog::builtin(), config());
        session.next();
        assert_eq!(session.undo(), Step::NothingToUndo);
        assert!(session.current_question().is_some());
    }

    #[test]
    fn single_candidate_after_opening_is_certain() {
        let mut session = Session::new(roster(), AttributeCatalog::builtin(), config());
        let mut step = session.next();
        let mut guard = 0;
        while let Step::Ask { question, .. } = &step {
            // Answer as if thinking of Neuer.
            let answer = match question {
                Question::Boolean(a) => Answer::from(roster()[2].get(a).and_then(|v| v.as_bool())),
                Question::Categorical(a, v) => match roster()[2].get(a) {
                    Some(own) => Answer::from(own == v),
                    None => Answer::Unknown,
                },
            };
            step = session.answer(answer).unwrap();
            guard += 1;
            assert!(guard < 20, "game did not terminate");
        }
        assert_eq!(
            step,
            Step::Result {
                name: "Neuer".into(),
                certain: true
            }
        );
        assert_eq!(session.phase(), SessionPhase::Result);
        assert!(session.answer(Answer::Yes).is_err());
    }

    #[test]
    fn confirmation_success_is_certain() {
        let entities = vec![
            Entity::new("Totti")
                .with("club", "Roma")
                .with("a", true)
                .with("b", true)
                .with("c", true)
                .with_rule(
                    ConfirmRule::new("leyenda_club", true)
                        .with_question("¿Jugó toda su carrera en la Roma?"),
                ),
            Entity::new("Del Piero").with("club", "Roma"),
        ];
        let config = Arc::new(EngineConfig {
            seed: Some(1),
            min_reveal_questions: 0,
            ..Default::default()
        });
        let mut session = Session::new(entities, AttributeCatalog::new(), config);

        // Steer the answers so Totti pulls ahead; after the third fact
        // p = 4 / (4 + 1) reaches the 0.8 threshold.
        let mut step = session.next();
        for attr in ["a", "b", "c"] {
            assert_ne!(session.phase(), SessionPhase::AwaitingConfirmation);
            session.current = Some(Question::boolean(attr));
            step = session.answer(Answer::Yes).unwrap();
        }
        assert_eq!(session.phase(), SessionPhase::AwaitingConfirmation);
        assert_eq!(session.next(), step);
        assert_eq!(
            step,
            Step::Ask {
                text: "¿Jugó toda su carrera en la Roma?".into(),
                question: Question::boolean("leyenda_club"),
            }
        );

        let step = session.answer(Answer::Yes).unwrap();
        assert_eq!(
            step,
            Step::Result {
                name: "Totti".into(),
                certain: true
            }
        );
    }
}
