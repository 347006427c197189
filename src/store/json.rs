//! JSON file store: the whole dataset in one pretty-printed document.
//!
//! ```json
//! {
//!   "catalog": { "zurdo": "¿Es zurdo?" },
//!   "catalog_version": 3,
//!   "entities": [
//!     { "name": "Messi", "attributes": { "posicion": "Delantero", "zurdo": true } }
//!   ]
//! }
//! ```
//!
//! Files written by older tools use `personajes`, `nombre` and `atributos`;
//! those names are accepted on read. Every operation re-reads the file so
//! external edits are picked up by the next session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CatalogStore, Dataset, StoreResult, normalize_entity};
use crate::entity::{AttrValue, AttributeCatalog, ConfirmRule, Entity};
use crate::error::StoreError;

// ---------------------------------------------------------------------------
// On-disk shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default)]
    catalog: Option<BTreeMap<String, String>>,
    #[serde(default)]
    catalog_version: u64,
    #[serde(default, alias = "personajes")]
    entities: Vec<RawEntity>,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(alias = "nombre")]
    name: String,
    #[serde(default, alias = "atributos")]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    confirm: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    attr: String,
    value: Value,
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct DatasetOut<'a> {
    catalog: &'a BTreeMap<String, String>,
    catalog_version: u64,
    entities: &'a [Entity],
}

/// Booleans and strings are the only attribute values the engine knows.
fn attr_value(value: Value) -> Option<AttrValue> {
    match value {
        Value::Bool(b) => Some(AttrValue::Bool(b)),
        Value::String(s) => Some(AttrValue::Category(s)),
        _ => None,
    }
}

impl RawEntity {
    fn into_entity(self) -> Entity {
        let mut entity = Entity::new(self.name);
        for (key, value) in self.attributes {
            match attr_value(value) {
                Some(v) => {
                    entity.attributes.insert(key, v);
                }
                None => tracing::warn!(
                    entity = %entity.name,
                    attr = %key,
                    "dropping attribute value that is neither boolean nor string"
                ),
            }
        }
        for rule in self.confirm {
            match attr_value(rule.value) {
                Some(value) => entity.confirm.push(ConfirmRule {
                    attr: rule.attr,
                    value,
                    question: rule.question,
                }),
                None => tracing::warn!(
                    entity = %entity.name,
                    attr = %rule.attr,
                    "dropping confirmation rule with unsupported value"
                ),
            }
        }
        normalize_entity(&mut entity);
        entity
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Dataset persisted as a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`, creating the file with the built-in catalog
    /// and no entities when it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self { path: path.into() };
        if !store.path.exists() {
            tracing::warn!(path = %store.path.display(), "dataset missing, creating a new one");
            store.write(&Dataset::builtin())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and normalize the whole dataset.
    pub fn read(&self) -> StoreResult<Dataset> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| self.io_error(source))?;
        let raw: RawDataset = serde_json::from_str(&text).map_err(|e| StoreError::Parse {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let catalog = match raw.catalog {
            Some(questions) => AttributeCatalog {
                version: raw.catalog_version,
                questions,
            },
            None => AttributeCatalog::builtin(),
        };
        let entities = raw.entities.into_iter().map(RawEntity::into_entity).collect();
        Ok(Dataset { catalog, entities })
    }

    /// Replace the file contents with `dataset`.
    pub fn write(&self, dataset: &Dataset) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let out = DatasetOut {
            catalog: &dataset.catalog.questions,
            catalog_version: dataset.catalog.version,
            entities: &dataset.entities,
        };
        let json = serde_json::to_string_pretty(&out).map_err(|e| StoreError::Serialize {
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json).map_err(|source| self.io_error(source))?;
        tracing::debug!(
            path = %self.path.display(),
            entities = dataset.entities.len(),
            "dataset written"
        );
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl CatalogStore for JsonFileStore {
    fn load_catalog(&self) -> StoreResult<AttributeCatalog> {
        Ok(self.read()?.catalog)
    }

    fn load_entities(&self) -> StoreResult<Vec<Entity>> {
        Ok(self.read()?.entities)
    }

    fn append_entity(&mut self, entity: Entity) -> StoreResult<()> {
        let mut dataset = self.read()?;
        dataset.append(entity)?;
        self.write(&dataset)
    }

    fn add_attribute(&mut self, question: &str, key: Option<&str>) -> StoreResult<String> {
        let mut dataset = self.read()?;
        let key = dataset.add_attribute(question, key)?;
        self.write(&dataset)?;
        Ok(key)
    }
}
