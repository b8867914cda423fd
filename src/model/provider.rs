//! Model providers - resolve the model instance a repository is bound to.

use std::any::Any;
use std::collections::HashMap;

use super::Model;
use crate::error::RepositoryError;

/// Resolves an instance of `M` for a repository.
///
/// Failing here is a wiring bug, reported as `RepositoryError::Configuration`.
pub trait ModelProvider<M: Model> {
    fn resolve(&self) -> Result<M, RepositoryError>;
}

/// Resolves any model with a `Default` instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl<M: Model + Default> ModelProvider<M> for DefaultProvider {
    fn resolve(&self) -> Result<M, RepositoryError> {
        Ok(M::default())
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Name-keyed factory registry.
///
/// Models resolve under their short type name (`Model::model_name`). A
/// binding that produces some other type is reported when resolved.
#[derive(Default)]
pub struct Container {
    bindings: HashMap<String, Factory>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to a factory. Rebinding replaces the previous factory.
    pub fn bind<T, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        T: Any + Send,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bindings
            .insert(name.into(), Box::new(move || Box::new(factory()) as Box<dyn Any + Send>));
        self
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Build whatever is bound to `name`.
    pub fn make(&self, name: &str) -> Result<Box<dyn Any + Send>, RepositoryError> {
        self.bindings
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| RepositoryError::Configuration(format!("{} is not bound", name)))
    }
}

impl<M: Model> ModelProvider<M> for Container {
    fn resolve(&self) -> Result<M, RepositoryError> {
        let name = M::model_name();
        self.make(name)?
            .downcast::<M>()
            .map(|model| *model)
            .map_err(|_| {
                RepositoryError::Configuration(format!(
                    "binding {} must produce an instance of model {}",
                    name,
                    std::any::type_name::<M>()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Gadget {
        id: String,
    }

    impl Model for Gadget {
        const COLLECTION: &'static str = "gadgets";
        fn id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn default_provider_resolves() {
        let gadget: Gadget = DefaultProvider.resolve().unwrap();
        assert_eq!(gadget, Gadget::default());
    }

    #[test]
    fn container_resolves_bound_model() {
        let mut container = Container::new();
        container.bind("Gadget", || Gadget { id: "g".into() });

        let gadget: Gadget = container.resolve().unwrap();
        assert_eq!(gadget.id, "g");
    }

    #[test]
    fn unbound_model_is_configuration_error() {
        let container = Container::new();
        let err = ModelProvider::<Gadget>::resolve(&container).unwrap_err();
        assert!(matches!(err, RepositoryError::Configuration(_)));
    }

    #[test]
    fn binding_to_non_model_is_configuration_error() {
        let mut container = Container::new();
        container.bind("Gadget", || "not a model".to_string());

        let err = ModelProvider::<Gadget>::resolve(&container).unwrap_err();
        assert!(matches!(err, RepositoryError::Configuration(_)));
    }
}
