use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The model provider could not produce a valid model for the repository.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("no {model} found with id {id}")]
    NotFound { model: String, id: String },
    #[error(transparent)]
    Store(ModelError),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

impl From<ModelError> for RepositoryError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotFound { collection, id } => RepositoryError::NotFound {
                model: collection,
                id,
            },
            other => RepositoryError::Store(other),
        }
    }
}
