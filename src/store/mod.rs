//! Catalog storage: where entities and the attribute catalog come from.
//!
//! The engine never touches storage directly. Hosts inject a [`CatalogStore`]
//! and the engine only asks it to load the current data or append an entity.
//!
//! - [`MemoryStore`]: everything in memory, for embedding and tests
//! - [`json::JsonFileStore`]: one JSON document on disk
//!
//! Both normalize data before it reaches the engine: positions are mapped onto
//! the four canonical labels, and entity names must be unique.

pub mod json;

use std::collections::{BTreeMap, BTreeSet};

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::entity::{AttrValue, AttributeCatalog, ConfirmRule, Entity, POSITION, POSITIONS};
use crate::error::StoreError;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Source of the catalog and entity set for new sessions.
pub trait CatalogStore {
    /// Boolean attribute → question text.
    fn load_catalog(&self) -> StoreResult<AttributeCatalog>;

    /// All entities, in stored order.
    fn load_entities(&self) -> StoreResult<Vec<Entity>>;

    /// Add a new entity. Names are unique keys.
    fn append_entity(&mut self, entity: Entity) -> StoreResult<()>;

    /// Add a boolean attribute to the catalog and return its key. The key is
    /// derived from `question` with [`slugify`] when not given.
    fn add_attribute(&mut self, question: &str, key: Option<&str>) -> StoreResult<String>;
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Catalog plus entities, with the validation shared by every store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub catalog: AttributeCatalog,
    pub entities: Vec<Entity>,
}

impl Dataset {
    /// Empty dataset with the built-in catalog.
    pub fn builtin() -> Self {
        Self {
            catalog: AttributeCatalog::builtin(),
            entities: Vec::new(),
        }
    }

    /// Validate, normalize and append `entity`.
    pub fn append(&mut self, mut entity: Entity) -> StoreResult<()> {
        entity.name = entity.name.trim().to_string();
        if entity.name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self.entities.iter().any(|e| e.name == entity.name) {
            return Err(StoreError::DuplicateEntity { name: entity.name });
        }
        normalize_entity(&mut entity);
        tracing::debug!(name = %entity.name, attributes = entity.attributes.len(), "entity appended");
        self.entities.push(entity);
        Ok(())
    }

    /// Add a catalog question, deriving the key when none is given.
    pub fn add_attribute(&mut self, question: &str, key: Option<&str>) -> StoreResult<String> {
        let key = match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => k.to_string(),
            None => slugify(question),
        };
        if key.is_empty() {
            return Err(StoreError::EmptyKey {
                question: question.to_string(),
            });
        }
        if self.catalog.contains(&key) {
            return Err(StoreError::DuplicateAttribute { key });
        }
        self.catalog.insert(key.clone(), question.trim());
        Ok(key)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// A store that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    dataset: Dataset,
}

impl MemoryStore {
    /// Empty store with the built-in catalog.
    pub fn new() -> Self {
        Self {
            dataset: Dataset::builtin(),
        }
    }

    /// Build a store from existing data. Entities are validated and
    /// normalized as if appended one by one.
    pub fn with_data(catalog: AttributeCatalog, entities: Vec<Entity>) -> StoreResult<Self> {
        let mut dataset = Dataset {
            catalog,
            entities: Vec::with_capacity(entities.len()),
        };
        for entity in entities {
            dataset.append(entity)?;
        }
        Ok(Self { dataset })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl CatalogStore for MemoryStore {
    fn load_catalog(&self) -> StoreResult<AttributeCatalog> {
        Ok(self.dataset.catalog.clone())
    }

    fn load_entities(&self) -> StoreResult<Vec<Entity>> {
        Ok(self.dataset.entities.clone())
    }

    fn append_entity(&mut self, entity: Entity) -> StoreResult<()> {
        self.dataset.append(entity)
    }

    fn add_attribute(&mut self, question: &str, key: Option<&str>) -> StoreResult<String> {
        self.dataset.add_attribute(question, key)
    }
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

/// Map free-text positions onto Portero / Defensa / Medio / Delantero.
///
/// Unrecognized text is returned capitalized but otherwise unchanged.
pub fn normalize_position(raw: &str) -> String {
    let capitalized = capitalize(raw.trim());
    if POSITIONS.contains(&capitalized.as_str()) {
        return capitalized;
    }
    let lower = capitalized.to_lowercase();
    let label = if lower.contains("port") {
        "Portero"
    } else if lower.contains("def") {
        "Defensa"
    } else if lower.contains("med") || lower.contains("cen") {
        "Medio"
    } else if lower.contains("del") {
        "Delantero"
    } else {
        return capitalized;
    };
    label.to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Normalize the categorical values of `entity` in place.
pub fn normalize_entity(entity: &mut Entity) {
    if let Some(AttrValue::Category(pos)) = entity.attributes.get_mut(POSITION) {
        *pos = normalize_position(pos);
    }
}

/// Confirmation rules for a newly learned entity: one per catalogued boolean
/// attribute it sets, carrying the catalog's question text. Attributes that
/// already have a rule keep it.
pub fn confirmation_rules(entity: &Entity, catalog: &AttributeCatalog) -> Vec<ConfirmRule> {
    entity
        .attributes
        .iter()
        .filter(|(attr, _)| !entity.confirm.iter().any(|r| &r.attr == *attr))
        .filter_map(|(attr, value)| {
            let flag = value.as_bool()?;
            let question = catalog.question(attr)?;
            Some(ConfirmRule::new(attr.as_str(), flag).with_question(question))
        })
        .collect()
}

/// Attribute key for a free-text question: accents stripped, lowercase,
/// words joined with `_`.
pub fn slugify(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();
    stripped.trim().to_lowercase().replace(' ', "_")
}

/// Every value seen per attribute, sorted, with `core` attributes always
/// present. Hosts use this to offer choices when entering a new entity.
pub fn value_domains<'a, I>(entities: &[Entity], core: I) -> BTreeMap<String, Vec<AttrValue>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut domains: BTreeMap<String, BTreeSet<AttrValue>> = BTreeMap::new();
    for entity in entities {
        for (k, v) in &entity.attributes {
            domains.entry(k.clone()).or_default().insert(v.clone());
        }
    }
    for key in core {
        domains.entry(key.to_string()).or_default();
    }
    domains
        .into_iter()
        .map(|(k, values)| {
            let mut values: Vec<AttrValue> = values.into_iter().collect();
            values.sort_by_key(|v| v.to_string());
            (k, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CORE_ATTRIBUTES;

    #[test]
    fn positions_normalize() {
        assert_eq!(normalize_position("delantero"), "Delantero");
        assert_eq!(normalize_position("PORTERO"), "Portero");
        assert_eq!(normalize_position("defensa central"), "Defensa");
        assert_eq!(normalize_position("centrocampista"), "Medio");
        assert_eq!(normalize_position("mediapunta"), "Medio");
        assert_eq!(normalize_position("extremo"), "Extremo");
    }

    #[test]
    fn slugify_strips_accents_and_punctuation() {
        assert_eq!(slugify("¿Jugó en la Selección?"), "jugo_en_la_seleccion");
        assert_eq!(slugify("  Balón de Oro  "), "balon_de_oro");
        assert_eq!(slugify("¿?"), "");
    }

    #[test]
    fn append_rejects_duplicates_and_blank_names() {
        let mut store = MemoryStore::new();
        store.append_entity(Entity::new("Pelé")).unwrap();
        assert!(matches!(
            store.append_entity(Entity::new("Pelé")),
            Err(StoreError::DuplicateEntity { .. })
        ));
        assert!(matches!(
            store.append_entity(Entity::new("   ")),
            Err(StoreError::EmptyName)
        ));
        assert_eq!(store.load_entities().unwrap().len(), 1);
    }

    #[test]
    fn append_normalizes_position() {
        let mut store = MemoryStore::new();
        store
            .append_entity(Entity::new("Puyol").with(POSITION, "defensor"))
            .unwrap();
        let entities = store.load_entities().unwrap();
        assert_eq!(entities[0].get(POSITION), Some(&AttrValue::from("Defensa")));
    }

    #[test]
    fn add_attribute_derives_key_and_bumps_version() {
        let mut store = MemoryStore::new();
        let before = store.load_catalog().unwrap().version;
        let key = store.add_attribute("¿Jugó un Mundial sub-20?", None).unwrap();
        assert_eq!(key, "jugo_un_mundial_sub-20");

        let catalog = store.load_catalog().unwrap();
        assert_eq!(catalog.version, before + 1);
        assert_eq!(catalog.question(&key), Some("¿Jugó un Mundial sub-20?"));

        assert!(matches!(
            store.add_attribute("Otra pregunta", Some("zurdo")),
            Err(StoreError::DuplicateAttribute { .. })
        ));
        assert!(matches!(
            store.add_attribute("¿?", None),
            Err(StoreError::EmptyKey { .. })
        ));
    }

    #[test]
    fn domains_include_core_attributes() {
        let entities = vec![
            Entity::new("a").with("club", "Santos").with("zurdo", true),
            Entity::new("b").with("club", "Barcelona"),
            Entity::new("c").with("club", "Santos"),
        ];
        let domains = value_domains(&entities, CORE_ATTRIBUTES);
        assert_eq!(
            domains["club"],
            vec![AttrValue::from("Barcelona"), AttrValue::from("Santos")]
        );
        assert!(domains["liga"].is_empty());
        assert_eq!(domains["zurdo"], vec![AttrValue::Bool(true)]);
    }

    #[test]
    fn learned_flags_become_confirmation_rules() {
        let catalog = AttributeCatalog::builtin();
        let entity = Entity::new("Totti")
            .with(POSITION, "Delantero")
            .with("zurdo", false)
            .with("leyenda_club", true)
            .with("tiene_tatuajes", true)
            .with("usa_10", true)
            .with_rule(ConfirmRule::new("usa_10", true).with_question("¿Llevó el 10 en la Roma?"));

        let rules = confirmation_rules(&entity, &catalog);
        assert_eq!(
            rules,
            vec![
                ConfirmRule::new("leyenda_club", true)
                    .with_question("¿Es considerado leyenda de su club?"),
                ConfirmRule::new("zurdo", false).with_question("¿Es zurdo?"),
            ]
        );
    }
}
