//! InMemoryModelStore - HashMap-backed model store for testing and development.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde_json::{Map, Value as Json};
use tracing::trace;

use super::{Columns, Model, ModelError, ModelStore, Page};
use crate::query::{self, Direction, Query, DELETED_AT};
use crate::value::Value;

/// Internal stored representation of a row.
struct StoredRow {
    id: String,
    attributes: Map<String, Json>,
}

impl StoredRow {
    /// Whether `deleted_at` is set. Only meaningful for soft-deleting tables.
    fn trashed(&self) -> bool {
        self.attributes
            .get(DELETED_AT)
            .is_some_and(|deleted_at| !deleted_at.is_null())
    }
}

/// Rows of one table, with the soft-delete capability of the model that
/// created it.
struct Table {
    soft_deletes: bool,
    rows: Vec<StoredRow>,
}

impl Table {
    fn new(soft_deletes: bool) -> Self {
        Self {
            soft_deletes,
            rows: Vec::new(),
        }
    }

    fn is_trashed(&self, row: &StoredRow) -> bool {
        self.soft_deletes && row.trashed()
    }

    fn live(&self) -> impl Iterator<Item = &StoredRow> {
        self.rows.iter().filter(|row| !self.is_trashed(row))
    }
}

/// How rows of one table reach rows of another during eager loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Related rows whose `foreign_key` equals this row's `local_key`.
    HasMany {
        related: String,
        foreign_key: String,
        local_key: String,
    },
    /// The related row whose `owner_key` equals this row's `foreign_key`.
    BelongsTo {
        related: String,
        foreign_key: String,
        owner_key: String,
    },
}

impl Relation {
    pub fn has_many(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::HasMany {
            related: related.into(),
            foreign_key: foreign_key.into(),
            local_key: "id".into(),
        }
    }

    pub fn belongs_to(related: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Relation::BelongsTo {
            related: related.into(),
            foreign_key: foreign_key.into(),
            owner_key: "id".into(),
        }
    }

    fn related(&self) -> &str {
        match self {
            Relation::HasMany { related, .. } | Relation::BelongsTo { related, .. } => related,
        }
    }
}

type Tables = HashMap<String, Table>;
type Relations = HashMap<String, HashMap<String, Relation>>;

/// Eager-load paths folded into a tree so `a` and `a.b` load `a` once.
#[derive(Default)]
struct EagerTree(BTreeMap<String, EagerTree>);

impl EagerTree {
    fn from_paths(paths: &[String]) -> Self {
        let mut root = EagerTree::default();
        for path in paths {
            let mut node = &mut root;
            for segment in path.split('.').filter(|s| !s.is_empty()) {
                node = node.0.entry(segment.to_string()).or_default();
            }
        }
        root
    }
}

/// In-memory model store backed by a HashMap.
///
/// Rows are kept per table in insertion order. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryModelStore {
    storage: Arc<RwLock<Tables>>,
    relations: Arc<RwLock<Relations>>,
}

impl Default for InMemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryModelStore {
    /// Create a new empty model store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            relations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a relation that queries on `table` can eager-load as `name`.
    pub fn define_relation(
        &self,
        table: &str,
        name: &str,
        relation: Relation,
    ) -> Result<(), ModelError> {
        let mut relations = self
            .relations
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))?;
        relations
            .entry(table.to_string())
            .or_default()
            .insert(name.to_string(), relation);
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, ModelError> {
        self.storage
            .read()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, ModelError> {
        self.storage
            .write()
            .map_err(|_| ModelError::Storage("lock poisoned".into()))
    }

    /// Rows of the query's table matching its scope and clauses, ordered.
    fn select<'a>(tables: &'a Tables, query: &Query) -> Vec<&'a StoredRow> {
        let Some(table) = tables.get(query.table()) else {
            return Vec::new();
        };

        let mut selected: Vec<&StoredRow> = table
            .rows
            .iter()
            .filter(|row| !(query.excludes_trashed() && table.is_trashed(row)))
            .filter(|row| query::matches(query.clauses(), &row.attributes))
            .collect();

        if !query.orders().is_empty() {
            selected.sort_by(|a, b| {
                for order in query.orders() {
                    let left = query::attribute(&a.attributes, &order.column);
                    let right = query::attribute(&b.attributes, &order.column);
                    let ordering = match order.direction {
                        Direction::Asc => left.sort_cmp(&right),
                        Direction::Desc => right.sort_cmp(&left),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        selected
    }

    /// Eager-load, project and deserialize selected rows.
    fn hydrate<M: Model>(
        &self,
        tables: &Tables,
        query: &Query,
        rows: &[&StoredRow],
        columns: &Columns,
    ) -> Result<Vec<M>, ModelError> {
        let tree = EagerTree::from_paths(query.eager_loads());
        let mut attributes: Vec<Map<String, Json>> =
            rows.iter().map(|row| row.attributes.clone()).collect();

        if !tree.0.is_empty() {
            let relations = self
                .relations
                .read()
                .map_err(|_| ModelError::Storage("lock poisoned".into()))?;
            load_relations(tables, &relations, query.table(), &mut attributes, &tree)?;
        }

        attributes
            .into_iter()
            .map(|row| {
                let projected: Map<String, Json> = row
                    .into_iter()
                    .filter(|(name, _)| columns.includes(name) || tree.0.contains_key(name))
                    .collect();
                deserialize(projected)
            })
            .collect()
    }
}

fn deserialize<M: Model>(attributes: Map<String, Json>) -> Result<M, ModelError> {
    serde_json::from_value(Json::Object(attributes)).map_err(|e| ModelError::Serde(e.to_string()))
}

fn same_key(left: &Value, right: &Value) -> bool {
    left.compare(right) == Some(Ordering::Equal)
}

fn load_relations(
    tables: &Tables,
    relations: &Relations,
    table: &str,
    rows: &mut [Map<String, Json>],
    tree: &EagerTree,
) -> Result<(), ModelError> {
    for (name, children) in &tree.0 {
        let relation = relations
            .get(table)
            .and_then(|defined| defined.get(name))
            .ok_or_else(|| ModelError::UnknownRelation {
                collection: table.to_string(),
                relation: name.clone(),
            })?;

        let candidates: Vec<&StoredRow> = tables
            .get(relation.related())
            .map(|related| related.live().collect())
            .unwrap_or_default();

        for row in rows.iter_mut() {
            let loaded = match relation {
                Relation::HasMany {
                    related,
                    foreign_key,
                    local_key,
                } => {
                    let key = query::attribute(row, local_key);
                    let mut many: Vec<Map<String, Json>> = candidates
                        .iter()
                        .filter(|c| same_key(&query::attribute(&c.attributes, foreign_key), &key))
                        .map(|c| c.attributes.clone())
                        .collect();
                    load_relations(tables, relations, related, &mut many, children)?;
                    Json::Array(many.into_iter().map(Json::Object).collect())
                }
                Relation::BelongsTo {
                    related,
                    foreign_key,
                    owner_key,
                } => {
                    let key = query::attribute(row, foreign_key);
                    let mut owner: Vec<Map<String, Json>> = candidates
                        .iter()
                        .find(|c| same_key(&query::attribute(&c.attributes, owner_key), &key))
                        .map(|c| vec![c.attributes.clone()])
                        .unwrap_or_default();
                    load_relations(tables, relations, related, &mut owner, children)?;
                    owner.pop().map(Json::Object).unwrap_or(Json::Null)
                }
            };
            row.insert(name.clone(), loaded);
        }
    }
    Ok(())
}

impl ModelStore for InMemoryModelStore {
    fn get<M: Model>(&self, query: &Query, columns: &Columns) -> Result<Vec<M>, ModelError> {
        let tables = self.read()?;
        let rows = Self::select(&tables, query);
        self.hydrate(&tables, query, &rows, columns)
    }

    fn paginate<M: Model>(
        &self,
        query: &Query,
        per_page: usize,
        page: usize,
        columns: &Columns,
    ) -> Result<Page<M>, ModelError> {
        let tables = self.read()?;
        let rows = Self::select(&tables, query);
        let per_page = per_page.max(1);
        let page = page.max(1);

        let window: Vec<&StoredRow> = rows
            .iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .copied()
            .collect();
        let items = self.hydrate(&tables, query, &window, columns)?;

        Ok(Page::new(items, rows.len(), per_page, page))
    }

    fn count(&self, query: &Query) -> Result<usize, ModelError> {
        let tables = self.read()?;
        Ok(Self::select(&tables, query).len())
    }

    fn find_or_fail<M: Model>(
        &self,
        query: &Query,
        id: &str,
        columns: &Columns,
    ) -> Result<M, ModelError> {
        let tables = self.read()?;
        let row = Self::select(&tables, query)
            .into_iter()
            .find(|row| row.id == id)
            .ok_or_else(|| ModelError::NotFound {
                collection: query.table().to_string(),
                id: id.to_string(),
            })?;

        let mut found = self.hydrate(&tables, query, &[row], columns)?;
        found.pop().ok_or_else(|| ModelError::NotFound {
            collection: query.table().to_string(),
            id: id.to_string(),
        })
    }

    fn lists(&self, query: &Query, value: &str, key: &str) -> Result<Vec<(Value, Value)>, ModelError> {
        let tables = self.read()?;
        let mut pairs: Vec<(Value, Value)> = Vec::new();

        for row in Self::select(&tables, query) {
            let pair = (
                query::attribute(&row.attributes, key),
                query::attribute(&row.attributes, value),
            );
            if query.is_distinct() && pairs.contains(&pair) {
                continue;
            }
            pairs.push(pair);
        }

        Ok(pairs)
    }

    fn create<M: Model>(&self, model: &M) -> Result<M, ModelError> {
        let attributes = match serde_json::to_value(model) {
            Ok(Json::Object(attributes)) => attributes,
            Ok(_) => {
                return Err(ModelError::Serde(format!(
                    "{} did not serialize to an object",
                    M::model_name()
                )))
            }
            Err(e) => return Err(ModelError::Serde(e.to_string())),
        };

        let mut tables = self.write()?;
        let rows = &mut tables
            .entry(M::COLLECTION.to_string())
            .or_insert_with(|| Table::new(M::SOFT_DELETES))
            .rows;

        if rows.iter().any(|row| row.id == model.id()) {
            return Err(ModelError::Conflict {
                collection: M::COLLECTION.to_string(),
                id: model.id().to_string(),
            });
        }

        rows.push(StoredRow {
            id: model.id().to_string(),
            attributes,
        });
        trace!(collection = M::COLLECTION, id = model.id(), "row inserted");

        Ok(model.clone())
    }

    fn update<M: Model>(&self, id: &str, attributes: &Map<String, Json>) -> Result<M, ModelError> {
        let mut tables = self.write()?;
        let row = tables
            .get_mut(M::COLLECTION)
            .and_then(|table| {
                let soft_deletes = table.soft_deletes;
                table
                    .rows
                    .iter_mut()
                    .find(|row| row.id == id && !(soft_deletes && row.trashed()))
            })
            .ok_or_else(|| ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: id.to_string(),
            })?;

        let mut merged = row.attributes.clone();
        merged.extend(attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

        let updated: M = deserialize(merged.clone())?;
        if updated.id() != id {
            return Err(ModelError::Unsupported(format!(
                "cannot change the primary key of {}:{}",
                M::COLLECTION,
                id
            )));
        }

        row.attributes = merged;
        trace!(collection = M::COLLECTION, id, "row updated");

        Ok(updated)
    }

    fn destroy<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let mut tables = self.write()?;
        let Some(table) = tables.get_mut(M::COLLECTION) else {
            return Ok(false);
        };
        let Some(index) = table
            .rows
            .iter()
            .position(|row| row.id == id && !table.is_trashed(row))
        else {
            return Ok(false);
        };
        let rows = &mut table.rows;

        if M::SOFT_DELETES {
            rows[index]
                .attributes
                .insert(DELETED_AT.to_string(), Json::String(Utc::now().to_rfc3339()));
            trace!(collection = M::COLLECTION, id, "row trashed");
        } else {
            rows.remove(index);
            trace!(collection = M::COLLECTION, id, "row removed");
        }

        Ok(true)
    }

    fn force_destroy<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        let mut tables = self.write()?;
        let Some(table) = tables.get_mut(M::COLLECTION) else {
            return Ok(false);
        };
        let before = table.rows.len();
        table.rows.retain(|row| row.id != id);
        Ok(table.rows.len() != before)
    }

    fn restore<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        if !M::SOFT_DELETES {
            return Err(ModelError::Unsupported(format!(
                "{} does not soft delete",
                M::model_name()
            )));
        }

        let mut tables = self.write()?;
        let row = tables
            .get_mut(M::COLLECTION)
            .and_then(|table| table.rows.iter_mut().find(|row| row.id == id))
            .ok_or_else(|| ModelError::NotFound {
                collection: M::COLLECTION.to_string(),
                id: id.to_string(),
            })?;

        if !row.trashed() {
            return Ok(false);
        }
        row.attributes.insert(DELETED_AT.to_string(), Json::Null);
        Ok(true)
    }
}
