//! Pairwise discrimination between the two leading candidates.

use std::collections::BTreeSet;

use crate::entity::{Entity, Question};
use crate::ledger::FactLedger;

use super::confirm::match_score;
use super::scorer::is_boolean_attr;

/// The two highest-scoring candidates (stable among ties), or fewer if fewer
/// candidates remain.
pub fn top_two<'a>(candidates: &[&'a Entity], ledger: &FactLedger) -> Vec<&'a Entity> {
    let mut scored: Vec<(&Entity, usize)> = candidates
        .iter()
        .map(|c| (*c, match_score(c, ledger)))
        .collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(2).map(|(c, _)| c).collect()
}

/// First question, in `preference` order, that tells `first` and `second` apart.
///
/// Attributes outside `preference` are tried afterwards in key order. An
/// attribute only discriminates when both candidates define it with different
/// values; boolean attributes produce a `Boolean` question, everything else a
/// `Categorical` question keyed to `first`'s value.
pub fn discriminate(
    first: &Entity,
    second: &Entity,
    ledger: &FactLedger,
    asked: &BTreeSet<Question>,
    preference: &[String],
) -> Option<Question> {
    let attrs: BTreeSet<&str> = first
        .attributes
        .keys()
        .chain(second.attributes.keys())
        .map(String::as_str)
        .collect();
    let preferred: Vec<&str> = preference
        .iter()
        .map(String::as_str)
        .filter(|a| attrs.contains(a))
        .collect();
    let rest = attrs.iter().copied().filter(|a| !preferred.contains(a));

    for attr in preferred.iter().copied().chain(rest) {
        if ledger.is_pinned(attr) {
            continue;
        }
        let (Some(va), Some(vb)) = (first.get(attr), second.get(attr)) else {
            continue;
        };
        if va == vb {
            continue;
        }
        let question = if is_boolean_attr(&[first, second], attr) {
            Question::boolean(attr)
        } else {
            Question::Categorical(attr.to_string(), va.clone())
        };
        if !asked.contains(&question) {
            return Some(question);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::entity::Answer;
    use crate::infer::filter::filter_candidates;

    fn prefs() -> Vec<String> {
        EngineConfig::default().discriminator_order
    }

    #[test]
    fn club_only_difference_yields_categorical_on_first() {
        let a = Entity::new("Xavi").with("posicion", "Medio").with("club", "Barcelona");
        let b = Entity::new("Alonso").with("posicion", "Medio").with("club", "Real Madrid");
        let q = discriminate(&a, &b, &FactLedger::new(), &BTreeSet::new(), &prefs());
        assert_eq!(q, Some(Question::categorical("club", "Barcelona")));
    }

    #[test]
    fn answering_no_keeps_only_the_second() {
        let entities = vec![
            Entity::new("Xavi").with("posicion", "Medio").with("club", "Barcelona"),
            Entity::new("Alonso").with("posicion", "Medio").with("club", "Real Madrid"),
        ];
        let q = discriminate(
            &entities[0],
            &entities[1],
            &FactLedger::new(),
            &BTreeSet::new(),
            &prefs(),
        )
        .unwrap();
        let mut ledger = FactLedger::new();
        ledger.record(&q, Answer::No);
        let left = filter_candidates(&entities, &ledger);
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].name, "Alonso");
    }

    #[test]
    fn preference_order_wins_over_key_order() {
        let a = Entity::new("a").with("balon_oro", true).with("club", "Milan").with("altura", "alta");
        let b = Entity::new("b").with("balon_oro", false).with("club", "Inter").with("altura", "baja");
        let q = discriminate(&a, &b, &FactLedger::new(), &BTreeSet::new(), &prefs());
        assert_eq!(q, Some(Question::categorical("club", "Milan")));
    }

    #[test]
    fn boolean_difference_and_asked_skip() {
        let a = Entity::new("a").with("balon_oro", true).with("apodo", "El Niño");
        let b = Entity::new("b").with("balon_oro", false).with("apodo", "El Pibe");
        let mut asked = BTreeSet::new();
        let q = discriminate(&a, &b, &FactLedger::new(), &asked, &prefs()).unwrap();
        assert_eq!(q, Question::boolean("balon_oro"));

        asked.insert(q);
        let q = discriminate(&a, &b, &FactLedger::new(), &asked, &prefs());
        assert_eq!(q, Some(Question::categorical("apodo", "El Niño")));
    }

    #[test]
    fn missing_or_equal_values_do_not_discriminate() {
        let a = Entity::new("a").with("club", "Boca").with("zurdo", true);
        let b = Entity::new("b").with("club", "Boca");
        assert_eq!(
            discriminate(&a, &b, &FactLedger::new(), &BTreeSet::new(), &prefs()),
            None
        );
    }

    #[test]
    fn top_two_ranks_by_match_score() {
        let entities = vec![
            Entity::new("low").with("zurdo", false),
            Entity::new("mid").with("usa_10", true),
            Entity::new("high").with("usa_10", true).with("zurdo", true),
        ];
        let refs: Vec<_> = entities.iter().collect();
        let mut ledger = FactLedger::new();
        ledger.record(&Question::boolean("usa_10"), Answer::Yes);
        ledger.record(&Question::boolean("zurdo"), Answer::Yes);

        let two: Vec<_> = top_two(&refs, &ledger).into_iter().map(|e| e.name.as_str()).collect();
        assert_eq!(two, vec!["high", "mid"]);
    }
}
