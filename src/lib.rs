mod criteria;
mod error;
mod model;
mod query;
mod repository;
mod value;

pub use criteria::{CriteriaList, Criterion, CustomCriterion};
pub use error::RepositoryError;
pub use model::{
    Columns, Container, DefaultProvider, InMemoryModelStore, Model, ModelError, ModelProvider,
    ModelStore, Page, Relation,
};
pub use query::{
    Boolean, Clause, Direction, Operator, Order, ParseDirectionError, Predicate, Query, DELETED_AT,
};
pub use repository::{Repository, RepositoryConfig, RepositoryScope};
pub use value::Value;

pub use repository_criteria_macros::Model;
