//! Candidate inference: narrowing the roster and choosing what to ask.
//!
//! All functions here are pure over borrowed candidates and a
//! [`FactLedger`](crate::ledger::FactLedger). Randomness, where used, comes in
//! through an explicit `Rng` argument so sessions stay reproducible.

pub mod confirm;
pub mod discriminate;
pub mod filter;
pub mod phase;
pub mod scorer;

pub use confirm::{Assessment, PendingConfirmation};
pub use phase::{Phase, PhaseScheduler};
pub use scorer::ScoredQuestion;
