// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # adivina
//!
//! A "guess the entity" engine: the player thinks of someone from a fixed
//! roster, answers yes / no / don't know, and the engine narrows the roster
//! until it can name them.
//!
//! ## Architecture
//!
//! - **Domain model** (`entity`): entities, attribute values, questions, answers
//! - **Fact ledger** (`ledger`): positive and negative facts from the answers
//! - **Inference** (`infer`): candidate filter, entropy scorer, phased opening,
//!   pairwise discriminator, confirmation gate
//! - **Session** (`session`): the question/answer state machine with undo by replay
//! - **Storage** (`store`): in-memory and JSON-file catalog stores
//! - **Engine** (`engine`): configuration plus a facade tying a store to a session
//!
//! ## Library usage
//!
//! ```no_run
//! use adivina::engine::{Engine, EngineConfig};
//! use adivina::entity::{Answer, Entity};
//! use adivina::session::Step;
//! use adivina::store::MemoryStore;
//!
//! let mut engine = Engine::new(MemoryStore::new(), EngineConfig::default()).unwrap();
//! engine
//!     .add_entity(Entity::new("Messi").with("posicion", "Delantero").with("zurdo", true))
//!     .unwrap();
//! while let Step::Ask { text, .. } = engine.next() {
//!     println!("{text}");
//!     engine.answer(Answer::Yes).unwrap();
//! }
//! ```

pub mod engine;
pub mod entity;
pub mod error;
pub mod infer;
pub mod ledger;
pub mod session;
pub mod store;
pub mod text;
