//! Diagnostic error types for the adivina engine.
//!
//! Inference itself never fails: an empty candidate set, an uncertain guess
//! and an empty undo stack are ordinary [`Step`](crate::session::Step) values.
//! What can fail is loading data, loading configuration, and driving a
//! session out of turn.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the adivina engine.
#[derive(Debug, Error, Diagnostic)]
pub enum AdivinaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Session(#[from] SessionError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    #[diagnostic(
        code(adivina::store::io),
        help(
            "A filesystem operation on the dataset failed. Check that the directory \
             exists, is writable, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset {path} is not valid JSON: {message}")]
    #[diagnostic(
        code(adivina::store::parse),
        help(
            "The dataset must be a JSON object with a `catalog` map and an `entities` \
             array. Fix the file by hand or move it aside to start from an empty dataset."
        )
    )]
    Parse { path: String, message: String },

    #[error("failed to serialize dataset: {message}")]
    #[diagnostic(code(adivina::store::serialize))]
    Serialize { message: String },

    #[error("an entity named \"{name}\" already exists")]
    #[diagnostic(
        code(adivina::store::duplicate_entity),
        help("Entity names are unique keys. Pick a different name or edit the existing entry.")
    )]
    DuplicateEntity { name: String },

    #[error("attribute key \"{key}\" is already in the catalog")]
    #[diagnostic(
        code(adivina::store::duplicate_attribute),
        help("Pass an explicit key, or reuse the existing attribute.")
    )]
    DuplicateAttribute { key: String },

    #[error("entity name must not be empty")]
    #[diagnostic(code(adivina::store::empty_name))]
    EmptyName,

    #[error("cannot derive an attribute key from \"{question}\"")]
    #[diagnostic(
        code(adivina::store::empty_key),
        help("The question has no letters or digits to build a key from. Pass an explicit key.")
    )]
    EmptyKey { question: String },
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(adivina::config::invalid),
        help("Check the EngineConfig fields. {message}")
    )]
    InvalidConfig { message: String },

    #[error("failed to parse configuration: {message}")]
    #[diagnostic(
        code(adivina::config::parse),
        help("The configuration file must be TOML with the EngineConfig field names.")
    )]
    Parse { message: String },

    #[error("failed to read configuration file {path}")]
    #[diagnostic(code(adivina::config::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("invalid session state: {message}")]
    #[diagnostic(
        code(adivina::session::invalid_state),
        help(
            "Answers are only accepted while a question is outstanding. Call `next()` \
             to obtain a question, or start a new session after a result."
        )
    )]
    InvalidState { message: String },
}

/// Convenience alias for functions returning adivina results.
pub type AdivinaResult<T> = std::result::Result<T, AdivinaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_to_top_level() {
        let err: AdivinaError = StoreError::DuplicateEntity {
            name: "Pelé".into(),
        }
        .into();
        assert!(matches!(
            err,
            AdivinaError::Store(StoreError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn display_messages_carry_fields() {
        let err = StoreError::DuplicateAttribute {
            key: "zurdo".into(),
        };
        assert!(format!("{err}").contains("zurdo"));

        let err = SessionError::InvalidState {
            message: "no question outstanding".into(),
        };
        assert!(format!("{err}").contains("no question outstanding"));
    }
}
