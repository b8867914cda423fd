#![allow(dead_code)]

use repository_criteria::{InMemoryModelStore, Model, ModelStore, Relation, Repository};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Model)]
#[model(table = "foos")]
pub struct Foo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bars: Vec<Bar>,
}

impl Foo {
    pub fn new(id: &str, name: &str, status: &str, age: u32, created_at: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: status.into(),
            age,
            created_at: created_at.into(),
            bars: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Model)]
#[model(table = "bars")]
pub struct Bar {
    pub id: String,
    pub foo_id: String,
    pub label: String,
}

/// Carries a `deleted_at` column without soft deletes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Model)]
pub struct Archive {
    pub id: String,
    pub parent_id: Option<String>,
    pub deleted_at: Option<String>,
}

pub type FooRepository = Repository<Foo, InMemoryModelStore>;
pub type ArchiveRepository = Repository<Archive, InMemoryModelStore>;

/// Five foos, three bars, and the `foos.bars` relation.
pub fn seeded_store() -> InMemoryModelStore {
    let store = InMemoryModelStore::new();

    for foo in [
        Foo::new("1", "Alice", "active", 30, "2024-01-10"),
        Foo::new("2", "Bob", "inactive", 25, "2024-03-05"),
        Foo::new("3", "Carol", "active", 41, "2023-11-20"),
        Foo::new("4", "Dave", "pending", 35, "2024-02-14"),
        Foo::new("5", "Alina", "inactive", 22, "2024-04-01"),
    ] {
        store.create(&foo).unwrap();
    }

    for (id, foo_id, label) in [("b1", "1", "alpha"), ("b2", "1", "beta"), ("b3", "3", "gamma")] {
        store
            .create(&Bar {
                id: id.into(),
                foo_id: foo_id.into(),
                label: label.into(),
            })
            .unwrap();
    }

    store
        .define_relation(Foo::COLLECTION, "bars", Relation::has_many("bars", "foo_id"))
        .unwrap();

    store
}

pub fn foo_repository() -> FooRepository {
    Repository::new(seeded_store())
}

pub fn ids(foos: &[Foo]) -> Vec<&str> {
    foos.iter().map(|f| f.id.as_str()).collect()
}

/// `a` is a root archived on 2024-01-01, `b` and `c` are its children.
pub fn archive_repository() -> ArchiveRepository {
    let store = InMemoryModelStore::new();
    for (id, parent_id, deleted_at) in [
        ("a", None, Some("2024-01-01T00:00:00+00:00")),
        ("b", Some("a"), None),
        ("c", Some("a"), None),
    ] {
        store
            .create(&Archive {
                id: id.into(),
                parent_id: parent_id.map(Into::into),
                deleted_at: deleted_at.map(Into::into),
            })
            .unwrap();
    }
    Repository::new(store)
}
