//! Question phrasing.
//!
//! Boolean questions prefer the catalog's text. Known categorical attributes
//! have fixed templates; anything else gets a generic phrasing built from a
//! readable attribute name.

use crate::entity::{AttrValue, AttributeCatalog, CLUB, LEAGUE, NATIONALITY, POSITION, Question};

/// Readable name for an attribute key, falling back to the key itself.
pub fn pretty_attr(attr: &str) -> &str {
    match attr {
        POSITION => "posición",
        NATIONALITY => "nacionalidad",
        LEAGUE => "liga",
        CLUB => "club",
        "zurdo" => "zurdo",
        "gano_mundial" => "ganador del Mundial",
        "balon_oro" => "Balón de Oro",
        "gano_champions" => "ganador de Champions",
        "usa_10" => "dorsal 10",
        "juega_en_europa" => "juega en Europa",
        "leyenda_club" => "leyenda del club",
        other => other,
    }
}

fn builtin_flag_text(attr: &str) -> Option<&'static str> {
    Some(match attr {
        "zurdo" => "¿Es zurdo?",
        "gano_mundial" => "¿Ganó la Copa del Mundo?",
        "balon_oro" => "¿Ganó el Balón de Oro?",
        "gano_champions" => "¿Ganó la UEFA Champions League?",
        "usa_10" => "¿Usa (o usó) el dorsal 10?",
        "juega_en_europa" => "¿Juega (o jugó) en Europa?",
        "leyenda_club" => "¿Es leyenda de su club?",
        _ => return None,
    })
}

fn position_text(label: &str) -> Option<&'static str> {
    Some(match label {
        "Portero" => "¿Es portero?",
        "Defensa" => "¿Es defensa?",
        "Medio" => "¿Es mediocampista?",
        "Delantero" => "¿Es delantero?",
        _ => return None,
    })
}

/// Text shown to the player for `question`.
pub fn question_text(question: &Question, catalog: &AttributeCatalog) -> String {
    match question {
        Question::Boolean(attr) => catalog
            .question(attr)
            .or_else(|| builtin_flag_text(attr))
            .map(str::to_string)
            .unwrap_or_else(|| format!("¿Tiene {}?", pretty_attr(attr))),
        Question::Categorical(attr, value) => categorical_text(attr, value),
    }
}

fn categorical_text(attr: &str, value: &AttrValue) -> String {
    match (attr, value) {
        (POSITION, AttrValue::Category(label)) => match position_text(label) {
            Some(text) => text.to_string(),
            None => format!("¿Su {} es «{value}»?", pretty_attr(attr)),
        },
        (NATIONALITY, _) => format!("¿Es de {value}?"),
        (LEAGUE, _) => format!("¿Juega/jugó en {value}?"),
        (CLUB, _) => format!("¿Jugó en {value}?"),
        _ => format!("¿Su {} es «{value}»?", pretty_attr(attr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_text_wins_for_flags() {
        let mut catalog = AttributeCatalog::new();
        catalog.insert("zurdo", "¿Patea con la izquierda?");
        assert_eq!(
            question_text(&Question::boolean("zurdo"), &catalog),
            "¿Patea con la izquierda?"
        );
        assert_eq!(
            question_text(&Question::boolean("zurdo"), &AttributeCatalog::new()),
            "¿Es zurdo?"
        );
        assert_eq!(
            question_text(&Question::boolean("leyenda_club"), &AttributeCatalog::new()),
            "¿Es leyenda de su club?"
        );
        assert_eq!(
            question_text(&Question::boolean("leyenda_club"), &AttributeCatalog::builtin()),
            "¿Es considerado leyenda de su club?"
        );
        assert_eq!(
            question_text(&Question::boolean("tatuajes"), &AttributeCatalog::new()),
            "¿Tiene tatuajes?"
        );
    }

    #[test]
    fn categorical_templates() {
        let catalog = AttributeCatalog::new();
        let cases = [
            (Question::categorical(POSITION, "Medio"), "¿Es mediocampista?"),
            (Question::categorical(NATIONALITY, "Brasil"), "¿Es de Brasil?"),
            (Question::categorical(LEAGUE, "Serie A"), "¿Juega/jugó en Serie A?"),
            (Question::categorical(CLUB, "Boca Juniors"), "¿Jugó en Boca Juniors?"),
            (Question::categorical("pie", "derecho"), "¿Su pie es «derecho»?"),
        ];
        for (q, expected) in cases {
            assert_eq!(question_text(&q, &catalog), expected);
        }
    }
}
