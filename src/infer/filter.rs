//! Candidate filtering against the fact ledger.
//!
//! Absence is not evidence: an entity that does not define an attribute is
//! never excluded by a fact about that attribute.

use crate::entity::Entity;
use crate::ledger::FactLedger;

/// Whether `entity` is consistent with every fact in `ledger`.
pub fn is_consistent(entity: &Entity, ledger: &FactLedger) -> bool {
    let positives_hold = ledger
        .positive()
        .iter()
        .all(|(k, v)| entity.get(k).is_none_or(|own| own == v));
    positives_hold
        && ledger
            .negative()
            .iter()
            .all(|(k, v)| entity.get(k).is_none_or(|own| own != v))
}

/// Entities consistent with the ledger, in roster order.
pub fn filter_candidates<'a>(entities: &'a [Entity], ledger: &FactLedger) -> Vec<&'a Entity> {
    entities
        .iter()
        .filter(|e| is_consistent(e, ledger))
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::seq::SliceRandom;

    use super::*;
    use crate::entity::{Answer, Question};

    fn roster() -> Vec<Entity> {
        vec![
            Entity::new("Messi")
                .with("posicion", "Delantero")
                .with("nacionalidad", "Argentina")
                .with("zurdo", true),
            Entity::new("Casillas")
                .with("posicion", "Portero")
                .with("nacionalidad", "España")
                .with("zurdo", false),
            Entity::new("Pirlo").with("posicion", "Medio"),
        ]
    }

    #[test]
    fn positive_fact_excludes_mismatches_only() {
        let entities = roster();
        let mut ledger = FactLedger::new();
        ledger.record(&Question::categorical("nacionalidad", "Argentina"), Answer::Yes);

        let names: Vec<_> = filter_candidates(&entities, &ledger)
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        // Pirlo has no nationality on record, so he survives.
        assert_eq!(names, vec!["Messi", "Pirlo"]);
    }

    #[test]
    fn negative_boolean_fact_excludes_true_holders() {
        let entities = roster();
        let mut ledger = FactLedger::new();
        ledger.record(&Question::boolean("zurdo"), Answer::No);

        let names: Vec<_> = filter_candidates(&entities, &ledger)
            .into_iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Casillas", "Pirlo"]);
    }

    #[test]
    fn unknown_answer_filters_nothing() {
        let entities = roster();
        let mut ledger = FactLedger::new();
        ledger.record(&Question::categorical("posicion", "Medio"), Answer::Unknown);
        assert_eq!(filter_candidates(&entities, &ledger).len(), 3);
    }

    #[test]
    fn adding_facts_never_grows_the_candidate_set() {
        let entities = roster();
        let questions = vec![
            Question::categorical("posicion", "Delantero"),
            Question::categorical("posicion", "Portero"),
            Question::categorical("nacionalidad", "España"),
            Question::boolean("zurdo"),
            Question::categorical("club", "Juventus"),
        ];
        let answers = [Answer::Yes, Answer::No, Answer::Unknown];
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let mut ledger = FactLedger::new();
            let mut previous = filter_candidates(&entities, &ledger).len();
            for _ in 0..6 {
                let q = questions.choose(&mut rng).unwrap();
                let a = *answers.choose(&mut rng).unwrap();
                // Only additive facts: skip overwriting an existing positive.
                if a == Answer::Yes && ledger.is_pinned(q.attribute()) {
                    continue;
                }
                ledger.record(q, a);
                let now = filter_candidates(&entities, &ledger).len();
                assert!(now <= previous);
                previous = now;
            }
        }
    }
}
