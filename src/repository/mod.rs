mod config;
mod repository;

pub use config::RepositoryConfig;
pub use repository::Repository;

/// Read-only view of a repository handed to criteria while they apply.
pub trait RepositoryScope {
    /// Short type name of the bound model.
    fn model_name(&self) -> &'static str;

    /// Table the repository's queries run against.
    fn table(&self) -> &'static str;

    fn soft_deletes(&self) -> bool;

    fn nested_data(&self) -> &[String];
}
