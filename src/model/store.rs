//! ModelStore - the persistence layer that executes queries for models.

use serde_json::{Map, Value as Json};

use super::{Columns, Model, ModelError, Page};
use crate::query::Query;
use crate::value::Value;

/// Executes [`Query`] values and performs entity writes.
///
/// Implementations decide how a query becomes rows (SQL, documents, memory)
/// but must honour its clauses, ordering, eager loads, distinctness and
/// soft-delete scoping.
pub trait ModelStore: Send + Sync {
    /// All rows matching the query.
    fn get<M: Model>(&self, query: &Query, columns: &Columns) -> Result<Vec<M>, ModelError>;

    /// The first matching row, if any.
    fn first<M: Model>(&self, query: &Query, columns: &Columns) -> Result<Option<M>, ModelError> {
        Ok(self.get(query, columns)?.into_iter().next())
    }

    /// One 1-based page of matching rows plus totals.
    fn paginate<M: Model>(
        &self,
        query: &Query,
        per_page: usize,
        page: usize,
        columns: &Columns,
    ) -> Result<Page<M>, ModelError>;

    /// Number of matching rows. Orders and eager loads are ignored.
    fn count(&self, query: &Query) -> Result<usize, ModelError>;

    /// The matching row with primary key `id`, or `ModelError::NotFound`.
    fn find_or_fail<M: Model>(
        &self,
        query: &Query,
        id: &str,
        columns: &Columns,
    ) -> Result<M, ModelError>;

    /// `(key, value)` attribute pairs of the matching rows, in query order.
    fn lists(&self, query: &Query, value: &str, key: &str) -> Result<Vec<(Value, Value)>, ModelError>;

    /// Insert a new row. Fails with `ModelError::Conflict` if the key exists.
    fn create<M: Model>(&self, model: &M) -> Result<M, ModelError>;

    /// Merge `attributes` into the live row with primary key `id`.
    fn update<M: Model>(&self, id: &str, attributes: &Map<String, Json>) -> Result<M, ModelError>;

    /// Delete by key: flags the row as trashed when `M::SOFT_DELETES`,
    /// removes it otherwise. Returns whether a live row was affected.
    fn destroy<M: Model>(&self, id: &str) -> Result<bool, ModelError>;

    /// Physically remove the row, trashed or not.
    fn force_destroy<M: Model>(&self, id: &str) -> Result<bool, ModelError>;

    /// Clear the trashed flag. Only valid for soft-deleting models.
    fn restore<M: Model>(&self, id: &str) -> Result<bool, ModelError>;
}
