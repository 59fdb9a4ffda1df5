use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Range error on {field}: {message}")]
    Range { field: String, message: String },

    #[error("Dependency cycle detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Unknown {kind} '{id}' referenced by task {referenced_by}")]
    UnknownReference {
        kind: ReferenceKind,
        id: String,
        referenced_by: String,
    },

    #[error("No agent in the fleet can run task {task} (type {task_type})")]
    CapabilityMismatch { task: String, task_type: String },
}

/// What an unresolved id was expected to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Task,
    Agent,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Task => write!(f, "task"),
            ReferenceKind::Agent => write!(f, "agent"),
        }
    }
}

impl Error {
    pub(crate) fn range(field: &str, message: impl Into<String>) -> Self {
        Error::Range {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
