//! Domain model: entities, attribute values, questions and answers.
//!
//! Everything here is plain data. The inference modules borrow these types;
//! the store owns and produces them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Well-known attribute keys
// ---------------------------------------------------------------------------

/// Playing position (categorical, normalized by the store).
pub const POSITION: &str = "posicion";
/// Nationality (categorical).
pub const NATIONALITY: &str = "nacionalidad";
/// League (categorical).
pub const LEAGUE: &str = "liga";
/// Club (categorical).
pub const CLUB: &str = "club";

/// Canonical position labels produced by [`crate::store::normalize_position`].
pub const POSITIONS: [&str; 4] = ["Portero", "Defensa", "Medio", "Delantero"];

/// Attribute keys every dataset is expected to know about, in priority order.
pub const CORE_ATTRIBUTES: [&str; 11] = [
    POSITION,
    NATIONALITY,
    LEAGUE,
    CLUB,
    "zurdo",
    "gano_mundial",
    "balon_oro",
    "gano_champions",
    "usa_10",
    "juega_en_europa",
    "leyenda_club",
];

// ---------------------------------------------------------------------------
// Attribute values
// ---------------------------------------------------------------------------

/// Value of a single attribute: a boolean flag or an opaque categorical token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Category(String),
}

impl AttrValue {
    /// Whether this value is boolean-typed.
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// The boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Category(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "Sí"),
            Self::Bool(false) => write!(f, "No"),
            Self::Category(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Category(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Category(s)
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An entity-specific check asked before committing to a guess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRule {
    /// Attribute the rule is about.
    pub attr: String,
    /// Value the entity is expected to have.
    pub value: AttrValue,
    /// Custom question text; phrased from the attribute when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl ConfirmRule {
    pub fn new(attr: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            attr: attr.into(),
            value: value.into(),
            question: None,
        }
    }

    /// Attach custom question text.
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }

    /// The question identifier that checks this rule.
    pub fn as_question(&self) -> Question {
        match &self.value {
            AttrValue::Bool(_) => Question::Boolean(self.attr.clone()),
            other => Question::Categorical(self.attr.clone(), other.clone()),
        }
    }
}

/// A guessable item: a unique name plus attribute facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confirm: Vec<ConfirmRule>,
}

impl Entity {
    /// Create an entity with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            confirm: Vec::new(),
        }
    }

    /// Builder: set an attribute.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder: append a confirmation rule.
    pub fn with_rule(mut self, rule: ConfirmRule) -> Self {
        self.confirm.push(rule);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}

// ---------------------------------------------------------------------------
// Attribute catalog
// ---------------------------------------------------------------------------

/// Boolean attributes with their canonical question text.
///
/// `version` increases on every mutation so a session can tell which catalog
/// it was started with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCatalog {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub questions: BTreeMap<String, String>,
}

impl AttributeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven flags every fresh dataset starts with.
    pub fn builtin() -> Self {
        let questions = [
            ("gano_mundial", "¿Ganó la Copa del Mundo?"),
            ("balon_oro", "¿Ha ganado el Balón de Oro?"),
            ("gano_champions", "¿Ganó la UEFA Champions League?"),
            ("usa_10", "¿Usa (o usó) el dorsal 10?"),
            ("zurdo", "¿Es zurdo?"),
            ("juega_en_europa", "¿Juega (o jugó) en Europa?"),
            ("leyenda_club", "¿Es considerado leyenda de su club?"),
        ]
        .into_iter()
        .map(|(k, q)| (k.to_string(), q.to_string()))
        .collect();
        Self {
            version: 0,
            questions,
        }
    }

    pub fn question(&self, key: &str) -> Option<&str> {
        self.questions.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.questions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.questions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Insert or replace a question, bumping the version.
    pub fn insert(&mut self, key: impl Into<String>, question: impl Into<String>) {
        self.questions.insert(key.into(), question.into());
        self.version += 1;
    }
}

// ---------------------------------------------------------------------------
// Questions and answers
// ---------------------------------------------------------------------------

/// Identifier of a yes/no question; the unit of "already asked" tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Question {
    /// "Is this boolean attribute true?"
    Boolean(String),
    /// "Does this attribute equal this value?"
    Categorical(String, AttrValue),
}

impl Question {
    pub fn boolean(attr: impl Into<String>) -> Self {
        Self::Boolean(attr.into())
    }

    pub fn categorical(attr: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self::Categorical(attr.into(), value.into())
    }

    /// The attribute this question is about.
    pub fn attribute(&self) -> &str {
        match self {
            Self::Boolean(a) | Self::Categorical(a, _) => a,
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(a) => write!(f, "{a}?"),
            Self::Categorical(a, v) => write!(f, "{a} = {v}?"),
        }
    }
}

/// A player's response to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
    Unknown,
}

impl From<Option<bool>> for Answer {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Yes,
            Some(false) => Self::No,
            None => Self::Unknown,
        }
    }
}

impl From<bool> for Answer {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}
