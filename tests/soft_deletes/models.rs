use repository_criteria::{InMemoryModelStore, Model, ModelStore, Relation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Model)]
#[model(soft_deletes)]
pub struct Post {
    pub id: String,
    pub writer_id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub deleted_at: Option<String>,
}

impl Post {
    pub fn new(id: &str, writer_id: &str, title: &str, status: &str) -> Self {
        Self {
            id: id.into(),
            writer_id: writer_id.into(),
            title: title.into(),
            status: status.into(),
            deleted_at: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Model)]
pub struct Writer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub posts: Vec<Post>,
}

pub fn seeded_store() -> InMemoryModelStore {
    let store = InMemoryModelStore::new();

    store
        .create(&Writer {
            id: "w1".into(),
            name: "Ada".into(),
            posts: Vec::new(),
        })
        .unwrap();

    for post in [
        Post::new("p1", "w1", "Hello", "draft"),
        Post::new("p2", "w1", "World", "published"),
        Post::new("p3", "w1", "Rust", "published"),
    ] {
        store.create(&post).unwrap();
    }

    store
        .define_relation(Writer::COLLECTION, "posts", Relation::has_many(Post::COLLECTION, "writer_id"))
        .unwrap();

    store
}
