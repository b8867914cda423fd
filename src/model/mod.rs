//! Models - typed rows a repository reads and writes through a [`ModelStore`].
//!
//! A model names its table, exposes its primary key and statically declares
//! whether it soft-deletes. Everything else is plain serde.
//!
//! ## Example
//!
//! ```ignore
//! use repository_criteria::{InMemoryModelStore, Model, ModelStore, Query, Columns};
//!
//! #[derive(Serialize, Deserialize, Clone, Model)]
//! #[model(table = "posts", soft_deletes)]
//! struct Post {
//!     pub id: String,
//!     pub title: String,
//!     #[serde(default)]
//!     pub deleted_at: Option<String>,
//! }
//!
//! let store = InMemoryModelStore::new();
//! store.create(&post)?;
//! let posts: Vec<Post> = store.get(&Query::for_model::<Post>(), &Columns::All)?;
//! ```
//!
//! [`ModelStore`]: crate::ModelStore

mod in_memory;
mod provider;
mod store;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Trait for types that can be persisted and queried.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The table holding this model's rows.
    const COLLECTION: &'static str;

    /// Whether deletes only flag rows as trashed (see [`DELETED_AT`]).
    ///
    /// [`DELETED_AT`]: crate::DELETED_AT
    const SOFT_DELETES: bool = false;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> &str;

    /// Short type name without its module path, used in messages.
    fn model_name() -> &'static str {
        short_type_name::<Self>()
    }
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Which attributes a read returns.
///
/// Deserializes from `null` (all columns) or a list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    #[default]
    All,
    Only(Vec<String>),
}

impl Columns {
    pub fn only<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Columns::Only(columns.into_iter().map(Into::into).collect())
    }

    /// Whether `column` survives the projection. `*` in a list selects all.
    pub fn includes(&self, column: &str) -> bool {
        match self {
            Columns::All => true,
            Columns::Only(list) => list.iter().any(|c| {
                let name = c.rsplit('.').next().unwrap_or(c);
                name == "*" || name == column
            }),
        }
    }
}

/// One page of results with the totals needed to render pagination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub per_page: usize,
    pub current_page: usize,
    pub last_page: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, per_page: usize, current_page: usize) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        Self {
            items,
            total,
            per_page,
            current_page,
            last_page,
        }
    }

    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Error type for model store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("model not found: {collection}:{id}")]
    NotFound { collection: String, id: String },
    /// A row with the same primary key already exists.
    #[error("model already exists: {collection}:{id}")]
    Conflict { collection: String, id: String },
    #[error("undefined relation {relation} on {collection}")]
    UnknownRelation { collection: String, relation: String },
    #[error("model serialization error: {0}")]
    Serde(String),
    #[error("model storage error: {0}")]
    Storage(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

pub use in_memory::{InMemoryModelStore, Relation};
pub use provider::{Container, DefaultProvider, ModelProvider};
pub use store::ModelStore;
