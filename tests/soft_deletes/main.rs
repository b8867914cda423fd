mod models;

use chrono::DateTime;
use repository_criteria::{
    Criterion, Direction, InMemoryModelStore, ModelError, Repository, RepositoryError, Value,
};
use models::{seeded_store, Post, Writer};

type PostRepository = Repository<Post, InMemoryModelStore>;

fn post_repository() -> PostRepository {
    Repository::new(seeded_store())
}

fn ids(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn delete_trashes_instead_of_removing() {
    let mut repo = post_repository();
    assert!(repo.soft_deletes());
    assert!(repo.delete("p2").unwrap());

    assert_eq!(ids(&repo.all(false).unwrap()), vec!["p1", "p3"]);
    assert_eq!(ids(&repo.all(true).unwrap()), vec!["p1", "p2", "p3"]);

    let trashed = repo.find("p2").unwrap();
    let deleted_at = trashed.deleted_at.expect("deleted_at is set");
    assert!(DateTime::parse_from_rfc3339(&deleted_at).is_ok());
}

#[test]
fn reads_exclude_trashed_rows() {
    let mut repo = post_repository();
    repo.delete("p2").unwrap();
    repo.push_criteria(Criterion::order_by("title", Direction::Desc));

    assert_eq!(repo.count().unwrap(), 2);
    assert_eq!(repo.first().unwrap().unwrap().title, "Rust");
    assert!(repo.find_by("title", "World").unwrap().is_none());

    let titles = repo.lists("title", "id", false).unwrap();
    assert_eq!(
        titles,
        vec![
            (Value::from("p3"), Value::from("Rust")),
            (Value::from("p1"), Value::from("Hello")),
        ]
    );
}

#[test]
fn paginate_with_trash() {
    let mut repo = post_repository();
    repo.delete("p1").unwrap();
    repo.set_rows(2);

    let live = repo.paginate(false).unwrap();
    assert_eq!(live.total, 2);
    assert_eq!(live.last_page, 1);

    let everything = repo.paginate(true).unwrap();
    assert_eq!(everything.total, 3);
    assert_eq!(ids(&everything.items), vec!["p1", "p2"]);
    assert!(everything.has_more_pages());
}

#[test]
fn rendered_sql_scopes_out_trashed_rows() {
    let mut repo = post_repository();
    repo.push_criteria(Criterion::or_equals([("status", "draft"), ("status", "published")]));

    repo.all(false).unwrap();
    assert_eq!(
        repo.query().unwrap().to_sql().0,
        "select * from posts where ((status = ? or status = ?)) and posts.deleted_at is null"
    );

    repo.all(true).unwrap();
    assert_eq!(
        repo.query().unwrap().to_sql().0,
        "select * from posts where (status = ? or status = ?)"
    );

    repo.clear_criteria().all(false).unwrap();
    assert_eq!(
        repo.query().unwrap().to_sql().0,
        "select * from posts where posts.deleted_at is null"
    );
}

#[test]
fn deleting_trashed_row_is_not_found() {
    let mut repo = post_repository();
    repo.delete("p3").unwrap();

    let err = repo.delete("p3").unwrap_err();
    assert_eq!(
        err,
        RepositoryError::NotFound {
            model: "Post".into(),
            id: "p3".into()
        }
    );
}

#[test]
fn update_skips_trashed_rows() {
    let mut repo = post_repository();
    repo.delete("p1").unwrap();

    let err = repo
        .update("p1", &serde_json::json!({"title": "Goodbye"}))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn force_delete_removes_trashed_rows() {
    let mut repo = post_repository();
    repo.delete("p2").unwrap();

    assert!(repo.force_delete("p2").unwrap());
    assert_eq!(ids(&repo.all(true).unwrap()), vec!["p1", "p3"]);
    assert!(repo.find("p2").unwrap_err().is_not_found());
}

#[test]
fn force_delete_removes_live_rows() {
    let mut repo = post_repository();
    assert!(repo.force_delete("p1").unwrap());
    assert_eq!(repo.all(true).unwrap().len(), 2);
}

#[test]
fn restore_brings_rows_back() {
    let mut repo = post_repository();
    repo.delete("p2").unwrap();

    assert!(repo.restore("p2").unwrap());
    let restored = repo.find("p2").unwrap();
    assert_eq!(restored.deleted_at, None);
    assert_eq!(repo.count().unwrap(), 3);

    assert!(!repo.restore("p2").unwrap());
    assert!(repo.restore("p9").unwrap_err().is_not_found());
}

#[test]
fn restore_is_unsupported_without_soft_deletes() {
    let mut writers: Repository<Writer, InMemoryModelStore> = Repository::new(seeded_store());
    assert!(!writers.soft_deletes());

    let err = writers.restore("w1").unwrap_err();
    assert!(matches!(err, RepositoryError::Store(ModelError::Unsupported(_))));
}

#[test]
fn eager_loads_skip_trashed_related_rows() {
    let store = seeded_store();
    let mut posts: PostRepository = Repository::new(store.clone());
    posts.delete("p1").unwrap();

    let mut writers: Repository<Writer, InMemoryModelStore> = Repository::new(store);
    writers.set_nested_data(["posts"]);

    let ada = writers.find("w1").unwrap();
    let titles: Vec<&str> = ada.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["World", "Rust"]);
}
