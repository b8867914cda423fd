use serde::Serialize;
use serde_json::Value as Json;
use tracing::{debug, warn};

use super::{RepositoryConfig, RepositoryScope};
use crate::criteria::{CriteriaList, Criterion};
use crate::error::RepositoryError;
use crate::model::{Columns, Model, ModelError, ModelProvider, ModelStore, Page};
use crate::query::{Direction, Operator, Query};
use crate::value::Value;

/// Criteria-driven data access for one model type.
///
/// Criteria and nested-data paths accumulate for the life of the instance.
/// Every list-shaped read (`all`, `paginate`, `first`, `count`, `lists`)
/// rebuilds its query from scratch and replays the criteria in push order;
/// lookups by key (`find`, `find_by`) start from a bare query and only
/// apply nested data.
pub struct Repository<M: Model, S: ModelStore> {
    store: S,
    criteria: CriteriaList,
    nested_data: Vec<String>,
    query: Option<Query>,
    rows: usize,
    page: usize,
    columns: Columns,
    soft_deletes: bool,
    model: Option<M>,
}

impl<M: Model, S: ModelStore> Repository<M, S> {
    /// A repository over `store` with no current model.
    pub fn new(store: S) -> Self {
        let defaults = RepositoryConfig::default();
        Self {
            store,
            criteria: CriteriaList::new(),
            nested_data: defaults.nested_data,
            query: None,
            rows: defaults.rows,
            page: defaults.page,
            columns: defaults.columns,
            soft_deletes: M::SOFT_DELETES,
            model: None,
        }
    }

    /// Build a repository whose current model comes from `provider`.
    pub fn with_provider<P: ModelProvider<M>>(store: S, provider: &P) -> Result<Self, RepositoryError> {
        let model = provider.resolve()?;
        let mut repository = Self::new(store);
        repository.model = Some(model);
        Ok(repository)
    }

    pub fn configure(&mut self, config: RepositoryConfig) -> &mut Self {
        self.rows = config.rows;
        self.page = config.page;
        self.columns = config.columns;
        self.nested_data = config.nested_data;
        self
    }

    /// All rows matching the accumulated criteria. `with_trash` includes
    /// soft-deleted rows when the model soft-deletes and is ignored otherwise.
    pub fn all(&mut self, with_trash: bool) -> Result<Vec<M>, RepositoryError> {
        self.apply_criteria().apply_nested_data().include_trashed(with_trash);
        debug!(model = M::model_name(), with_trash, "fetching all");

        let query = self.query.get_or_insert_with(Query::for_model::<M>);
        self.store.get(query, &self.columns).map_err(Self::lift)
    }

    pub fn paginate(&mut self, with_trash: bool) -> Result<Page<M>, RepositoryError> {
        self.apply_criteria().apply_nested_data().include_trashed(with_trash);
        debug!(
            model = M::model_name(),
            rows = self.rows,
            page = self.page,
            with_trash,
            "paginating"
        );

        let query = self.query.get_or_insert_with(Query::for_model::<M>);
        self.store
            .paginate(query, self.rows, self.page, &self.columns)
            .map_err(Self::lift)
    }

    pub fn first(&mut self) -> Result<Option<M>, RepositoryError> {
        self.apply_criteria().apply_nested_data();
        debug!(model = M::model_name(), "fetching first");

        let query = self.query.get_or_insert_with(Query::for_model::<M>);
        self.store.first(query, &self.columns).map_err(Self::lift)
    }

    pub fn count(&mut self) -> Result<usize, RepositoryError> {
        self.apply_criteria();
        debug!(model = M::model_name(), "counting");

        let query = self.query.get_or_insert_with(Query::for_model::<M>);
        self.store.count(query).map_err(Self::lift)
    }

    /// Look up by primary key, ignoring accumulated criteria. Soft-deleted
    /// rows are found too. Fails with `RepositoryError::NotFound`.
    pub fn find(&mut self, id: &str) -> Result<M, RepositoryError> {
        self.query = Some(Query::for_model::<M>());
        self.apply_nested_data();
        if self.soft_deletes {
            self.include_trashed(true);
        }
        debug!(model = M::model_name(), id, "finding");

        let query = self.query.get_or_insert_with(Query::for_model::<M>);
        let found = self
            .store
            .find_or_fail::<M>(query, id, &self.columns)
            .map_err(Self::lift)?;
        self.model = Some(found.clone());
        Ok(found)
    }

    /// First row whose `attribute` equals `value`, ignoring accumulated criteria.
    pub fn find_by(&mut self, attribute: &str, value: impl Into<Value>) -> Result<Option<M>, RepositoryError> {
        self.query = Some(Query::for_model::<M>());
        self.apply_nested_data();
        debug!(model = M::model_name(), attribute, "finding by attribute");

        let query = self
            .take_query()
            .and_where(attribute, Operator::Eq, value);
        let query = self.query.insert(query);
        self.store.first(query, &self.columns).map_err(Self::lift)
    }

    /// `(key, value)` pairs of two attributes over the filtered rows.
    pub fn lists(&mut self, value: &str, key: &str, distinct: bool) -> Result<Vec<(Value, Value)>, RepositoryError> {
        self.apply_criteria();
        if distinct {
            let query = self.take_query().distinct();
            self.query = Some(query);
        }
        debug!(model = M::model_name(), value, key, distinct, "listing");

        let query = self.query.get_or_insert_with(Query::for_model::<M>);
        self.store.lists(query, value, key).map_err(Self::lift)
    }

    /// Insert `model` and make it the current model.
    pub fn create(&mut self, model: M) -> Result<M, RepositoryError> {
        let created = self.store.create(&model).map_err(Self::lift)?;
        debug!(model = M::model_name(), id = created.id(), "created");
        self.model = Some(created.clone());
        Ok(created)
    }

    /// Merge `attributes` (anything serializing to an object) into the row
    /// with key `id` and make the result the current model.
    pub fn update<P: Serialize + ?Sized>(&mut self, id: &str, attributes: &P) -> Result<M, RepositoryError> {
        let attributes = match serde_json::to_value(attributes) {
            Ok(Json::Object(attributes)) => attributes,
            Ok(_) => {
                return Err(RepositoryError::Store(ModelError::Serde(
                    "update attributes must serialize to an object".into(),
                )))
            }
            Err(e) => return Err(RepositoryError::Store(ModelError::Serde(e.to_string()))),
        };

        let current = self.locate(id, false)?;
        self.model = Some(current);

        let updated = self.store.update::<M>(id, &attributes).map_err(Self::lift)?;
        debug!(model = M::model_name(), id, "updated");
        self.model = Some(updated.clone());
        Ok(updated)
    }

    /// Delete by key; soft-deletes when the model supports it.
    pub fn delete(&mut self, id: &str) -> Result<bool, RepositoryError> {
        self.locate(id, false)?;
        debug!(model = M::model_name(), id, soft = self.soft_deletes, "deleting");
        self.store.destroy::<M>(id).map_err(Self::lift)
    }

    /// Physically delete by key. Unlike `delete`, the lookup sees rows that are
    /// already soft-deleted, so trashed rows can still be purged.
    pub fn force_delete(&mut self, id: &str) -> Result<bool, RepositoryError> {
        self.locate(id, true)?;
        debug!(model = M::model_name(), id, "force deleting");
        self.store.force_destroy::<M>(id).map_err(Self::lift)
    }

    /// Bring a soft-deleted row back.
    pub fn restore(&mut self, id: &str) -> Result<bool, RepositoryError> {
        self.locate(id, true)?;
        debug!(model = M::model_name(), id, "restoring");
        self.store.restore::<M>(id).map_err(Self::lift)
    }

    /// Append a criterion; it applies after every criterion already pushed.
    pub fn push_criteria(&mut self, criterion: Criterion) -> &mut Self {
        self.criteria.push(criterion);
        self
    }

    /// Push an ordering built from the first `(column, direction)` entry.
    /// Further entries are ignored.
    pub fn set_order<I, C>(&mut self, order: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, Direction)>,
        C: Into<String>,
    {
        let mut entries = order.into_iter();
        match entries.next() {
            Some((column, direction)) => {
                let ignored = entries.count();
                if ignored > 0 {
                    debug!(model = M::model_name(), ignored, "set_order uses only the first entry");
                }
                self.push_criteria(Criterion::order_by(column, direction))
            }
            None => {
                debug!(model = M::model_name(), "set_order called without entries");
                self
            }
        }
    }

    pub fn criteria(&self) -> &CriteriaList {
        &self.criteria
    }

    pub fn clear_criteria(&mut self) -> &mut Self {
        self.criteria.clear();
        self
    }

    pub fn set_rows(&mut self, rows: usize) -> &mut Self {
        self.rows = rows;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn set_page(&mut self, page: usize) -> &mut Self {
        self.page = page;
        self
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_columns(&mut self, columns: Columns) -> &mut Self {
        self.columns = columns;
        self
    }

    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn set_nested_data<I, P>(&mut self, nested_data: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.nested_data = nested_data.into_iter().map(Into::into).collect();
        self
    }

    pub fn nested_data(&self) -> &[String] {
        &self.nested_data
    }

    /// Replace the scratch query. The next read rebuilds it regardless.
    pub fn set_query(&mut self, query: Query) -> &mut Self {
        self.query = Some(query);
        self
    }

    /// The query the last operation ran, if any.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn set_model(&mut self, model: M) -> &mut Self {
        self.model = Some(model);
        self
    }

    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    pub fn model_name(&self) -> &'static str {
        M::model_name()
    }

    pub fn soft_deletes(&self) -> bool {
        self.soft_deletes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn take_query(&mut self) -> Query {
        self.query.take().unwrap_or_else(Query::for_model::<M>)
    }

    /// Fresh query for the model with every criterion folded over it.
    fn apply_criteria(&mut self) -> &mut Self {
        debug!(
            model = M::model_name(),
            criteria = self.criteria.len(),
            "applying criteria"
        );
        let query = self.criteria.apply(Query::for_model::<M>(), &*self);
        self.query = Some(query);
        self
    }

    fn apply_nested_data(&mut self) -> &mut Self {
        let start = self.take_query();
        let query = self
            .nested_data
            .iter()
            .fold(start, |query, path| query.with(path.as_str()));
        self.query = Some(query);
        self
    }

    fn include_trashed(&mut self, with_trash: bool) -> &mut Self {
        if !with_trash {
            return self;
        }
        if !self.soft_deletes {
            warn!(
                model = M::model_name(),
                "trashed rows requested for a model without soft deletes"
            );
            return self;
        }
        let query = self.take_query().with_trashed();
        self.query = Some(query);
        self
    }

    /// Or-fail lookup by key on a bare query, outside the scratch query.
    fn locate(&self, id: &str, with_trashed: bool) -> Result<M, RepositoryError> {
        let mut query = Query::for_model::<M>();
        if with_trashed {
            query = query.with_trashed();
        }
        self.store
            .find_or_fail(&query, id, &Columns::All)
            .map_err(Self::lift)
    }

    /// Store errors, with not-found reported under the model's name.
    fn lift(err: ModelError) -> RepositoryError {
        match err {
            ModelError::NotFound { id, .. } => RepositoryError::NotFound {
                model: M::model_name().to_string(),
                id,
            },
            other => RepositoryError::from(other),
        }
    }
}

impl<M: Model, S: ModelStore> RepositoryScope for Repository<M, S> {
    fn model_name(&self) -> &'static str {
        M::model_name()
    }

    fn table(&self) -> &'static str {
        M::COLLECTION
    }

    fn soft_deletes(&self) -> bool {
        self.soft_deletes
    }

    fn nested_data(&self) -> &[String] {
        &self.nested_data
    }
}
