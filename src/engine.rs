//! Engine facade: top-level API for adivina.
//!
//! The `Engine` binds a [`CatalogStore`] to one game [`Session`] and is what
//! hosts talk to. Loading, appending and session restarts go through here.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::entity::{Answer, CLUB, CORE_ATTRIBUTES, Entity, LEAGUE, NATIONALITY, POSITION};
use crate::error::{AdivinaResult, ConfigError};
use crate::session::{Session, SessionPhase, Step};
use crate::store::{CatalogStore, confirmation_rules};

/// Configuration for the adivina engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Questions drawn from `basic_pool` before moving on (default: 2).
    pub phase_basic_questions: usize,
    /// Questions drawn from `context_pool` after the basic ones (default: 2).
    pub phase_context_questions: usize,
    /// Answers required before any result may be presented (default: 4).
    pub min_reveal_questions: usize,
    /// Leader probability that triggers confirmation (default: 0.80).
    pub confirm_probability: f64,
    /// Random tie-break among the best `top_k` questions (default: 4).
    pub top_k: usize,
    /// Fixed RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub basic_pool: Vec<String>,
    pub context_pool: Vec<String>,
    pub core_attributes: Vec<String>,
    /// Attribute preference for telling the two leaders apart.
    pub discriminator_order: Vec<String>,
}

fn owned(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            phase_basic_questions: 2,
            phase_context_questions: 2,
            min_reveal_questions: 4,
            confirm_probability: 0.80,
            top_k: 4,
            seed: None,
            basic_pool: owned(&[POSITION, NATIONALITY]),
            context_pool: owned(&[LEAGUE]),
            core_attributes: owned(&CORE_ATTRIBUTES),
            discriminator_order: owned(&[
                POSITION,
                NATIONALITY,
                LEAGUE,
                CLUB,
                "balon_oro",
                "gano_mundial",
                "gano_champions",
                "usa_10",
                "zurdo",
                "juega_en_europa",
                "leyenda_club",
            ]),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "top_k must be >= 1".into(),
            });
        }
        if !(self.confirm_probability > 0.0 && self.confirm_probability <= 1.0) {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "confirm_probability must be in (0, 1], got {}",
                    self.confirm_probability
                ),
            });
        }
        Ok(())
    }
}

/// The adivina guessing engine.
///
/// Owns the store and the current session. Hosts drive it with
/// [`next`](Self::next), [`answer`](Self::answer) and [`undo`](Self::undo).
pub struct Engine<S: CatalogStore> {
    config: Arc<EngineConfig>,
    store: S,
    session: Session,
}

impl<S: CatalogStore> Engine<S> {
    /// Create an engine over `store` and start the first session.
    pub fn new(store: S, config: EngineConfig) -> AdivinaResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let session = Session::new(
            store.load_entities()?,
            store.load_catalog()?,
            Arc::clone(&config),
        );
        tracing::info!(
            entities = session.entities().len(),
            catalog_version = session.catalog_version(),
            "initializing adivina engine"
        );
        Ok(Self {
            config,
            store,
            session,
        })
    }

    /// Reload catalog and entities from the store and begin a new game.
    pub fn start_session(&mut self) -> AdivinaResult<()> {
        let entities = self.store.load_entities()?;
        let catalog = self.store.load_catalog()?;
        self.session.start(entities, catalog);
        Ok(())
    }

    pub fn next(&mut self) -> Step {
        self.session.next()
    }

    pub fn answer(&mut self, answer: Answer) -> AdivinaResult<Step> {
        Ok(self.session.answer(answer)?)
    }

    pub fn undo(&mut self) -> Step {
        self.session.undo()
    }

    /// Persist a new entity, then start a fresh session that includes it.
    pub fn add_entity(&mut self, entity: Entity) -> AdivinaResult<()> {
        let name = entity.name.clone();
        self.store.append_entity(entity)?;
        tracing::info!(%name, "entity added");
        self.start_session()
    }

    /// Persist a learned entity. Every catalogued flag it sets also becomes a
    /// confirmation rule phrased with the store's current catalog text.
    pub fn add_entity_with_rules(&mut self, mut entity: Entity) -> AdivinaResult<()> {
        let catalog = self.store.load_catalog()?;
        let rules = confirmation_rules(&entity, &catalog);
        tracing::debug!(name = %entity.name, rules = rules.len(), "derived confirmation rules");
        entity.confirm.extend(rules);
        self.add_entity(entity)
    }

    /// Add a boolean attribute to the catalog. The running session keeps the
    /// catalog it started with.
    pub fn add_attribute(&mut self, question: &str, key: Option<&str>) -> AdivinaResult<String> {
        let key = self.store.add_attribute(question, key)?;
        tracing::info!(%key, "attribute added to catalog");
        Ok(key)
    }

    /// Facts confirmed so far, for pre-filling a new entity after a miss.
    pub fn prefill(&self) -> Entity {
        let mut entity = Entity::new("");
        for (attr, value) in self.session.snapshot().ledger.positive() {
            entity.attributes.insert(attr.clone(), value.clone());
        }
        entity
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn info(&self) -> EngineInfo {
        EngineInfo {
            entity_count: self.session.entities().len(),
            catalog_size: self.session.catalog().len(),
            catalog_version: self.session.catalog_version(),
            answers: self.session.history().len(),
            candidates: self.session.candidates().len(),
            phase: self.session.phase(),
        }
    }
}

/// Summary information about the engine state.
#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub entity_count: usize,
    pub catalog_size: usize,
    pub catalog_version: u64,
    pub answers: usize,
    pub candidates: usize,
    pub phase: SessionPhase,
}

impl std::fmt::Display for EngineInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "adivina engine info")?;
        writeln!(f, "  entities:     {}", self.entity_count)?;
        writeln!(f, "  catalog:      {} (v{})", self.catalog_size, self.catalog_version)?;
        writeln!(f, "  answers:      {}", self.answers)?;
        writeln!(f, "  candidates:   {}", self.candidates)?;
        writeln!(f, "  phase:        {}", self.phase)?;
        Ok(())
    }
}

impl<S: CatalogStore> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("entities", &self.session.entities().len())
            .field("phase", &self.session.phase())
            .finish()
    }
}
