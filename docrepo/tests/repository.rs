use bson::{Bson, doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use docrepo::{memory::InMemoryStore, prelude::*};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "people")]
#[serde(default)]
struct Person {
    #[entity(id)]
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    age: i32,
}

impl Person {
    fn new(name: &str, age: i32) -> Self {
        Self { id: None, name: name.to_string(), age }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[serde(default)]
struct Note {
    #[entity(id)]
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "plain")]
struct Plain {
    #[entity(id)]
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
    age: i32,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn no_or() -> OrFilters {
    OrFilters::new()
}

async fn seeded(people: &[(&str, i32)]) -> Repository<InMemoryStore, Person> {
    init_tracing();
    let repository = Repository::new(InMemoryStore::new());

    for (name, age) in people {
        repository.save(&Person::new(name, *age)).await.unwrap();
    }

    repository
}

fn names(people: &[Person]) -> Vec<&str> {
    people.iter().map(|p| p.name.as_str()).collect()
}

#[tokio::test]
async fn collection_name_comes_from_attribute_or_type_name() {
    assert_eq!(Person::collection_name(), "people");
    assert_eq!(Note::collection_name(), "Note");

    let repository = Repository::<_, Person>::new(InMemoryStore::new());
    assert_eq!(repository.collection(), "people");
}

#[tokio::test]
async fn save_without_identifier_inserts() {
    let repository = seeded(&[]).await;

    repository.save(&Person::new("Ann", 30)).await.unwrap();

    let stored = repository.find_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Ann");
    assert!(stored[0].id.is_some());
}

#[tokio::test]
async fn save_with_identifier_updates_in_place() {
    let repository = seeded(&[("Ann", 30)]).await;
    let mut ann = repository.find_all().await.unwrap().remove(0);
    let id = ann.id;

    ann.age = 31;
    repository.save(&ann).await.unwrap();

    let stored = repository.find_all().await.unwrap();
    assert_eq!(stored, vec![Person { id, name: "Ann".into(), age: 31 }]);
}

#[tokio::test]
async fn update_of_unknown_identifier_fails_without_inserting() {
    let repository = seeded(&[]).await;
    let ghost = Person { id: Some(ObjectId::new()), ..Person::new("Ghost", 1) };

    let err = repository.update(&ghost).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NoRecordUpdated { id, ref collection } if Some(id) == ghost.id && collection == "people"
    ));

    // `save` routes to `update` for entities with an identifier.
    assert!(matches!(
        repository.save(&ghost).await,
        Err(RepositoryError::NoRecordUpdated { .. })
    ));
    assert_eq!(repository.count(&doc! {}, &no_or()).await.unwrap(), 0);
}

#[tokio::test]
async fn update_without_identifier_is_rejected() {
    let repository = seeded(&[]).await;

    let err = repository.update(&Person::new("Ann", 30)).await.unwrap_err();

    assert!(matches!(err, RepositoryError::MissingIdentifier(_)));
    assert!(err.is_caller_error());
}

#[tokio::test]
async fn delete_removes_entity() {
    let repository = seeded(&[("Ann", 30), ("Bob", 40)]).await;
    let ann = repository
        .find_one(&doc! { "name": "ann" }, &no_or())
        .await
        .unwrap()
        .unwrap();

    repository.delete(&ann).await.unwrap();

    assert_eq!(names(&repository.find_all().await.unwrap()), ["Bob"]);
}

#[tokio::test]
async fn delete_of_unknown_identifier_succeeds() {
    let repository = seeded(&[("Ann", 30)]).await;
    let ghost = Person { id: Some(ObjectId::new()), ..Person::new("Ghost", 1) };

    repository.delete(&ghost).await.unwrap();
    repository.delete(&ghost).await.unwrap();

    assert_eq!(repository.count(&doc! {}, &no_or()).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_without_identifier_is_a_no_op() {
    let repository = seeded(&[("Ann", 30)]).await;

    repository.delete(&Person::new("Ann", 30)).await.unwrap();

    assert_eq!(names(&repository.find_all().await.unwrap()), ["Ann"]);
}

#[tokio::test]
async fn documents_missing_fields_load_with_zero_values() {
    init_tracing();
    let store = InMemoryStore::new();
    let id = store.insert_document("plain", doc! { "name": "Ann" }).await.unwrap();
    let repository = Repository::<_, Plain>::new(store);

    let loaded = repository.find_all().await.unwrap();

    assert_eq!(loaded, vec![Plain { id: Some(id), name: "Ann".into(), age: 0 }]);
}

#[tokio::test]
async fn string_filters_match_case_insensitive_substrings() {
    let repository = seeded(&[("Ann", 20), ("Bob", 30), ("Anna", 40), ("joanne", 50)]).await;

    let page = repository
        .paginate(&PageRequest::new(0, 10), &doc! { "name": "ann" }, &no_or())
        .await
        .unwrap();

    assert_eq!(names(&page), ["Ann", "Anna", "joanne"]);
}

#[tokio::test]
async fn string_filters_are_patterns() {
    let repository = seeded(&[("Ann", 20), ("Bob", 30), ("Ben", 40)]).await;

    let page = repository
        .paginate(&PageRequest::new(0, 10), &doc! { "name": "^b.n" }, &no_or())
        .await
        .unwrap();

    assert_eq!(names(&page), ["Ben"]);
}

#[tokio::test]
async fn non_string_filters_match_by_equality() {
    let repository = seeded(&[("Ann", 30), ("Bob", 31), ("Cid", 30), ("Dee", 300)]).await;

    let page = repository
        .paginate(&PageRequest::new(0, 10), &doc! { "age": 30 }, &no_or())
        .await
        .unwrap();

    assert_eq!(names(&page), ["Ann", "Cid"]);
}

#[tokio::test]
async fn filters_are_conjunctive() {
    let repository = seeded(&[("Ann", 30), ("Anna", 31), ("Bob", 30)]).await;

    let matched = repository
        .count(&doc! { "name": "ann", "age": 30 }, &no_or())
        .await
        .unwrap();

    assert_eq!(matched, 1);
}

#[tokio::test]
async fn keyset_pages_survive_concurrent_writes() {
    init_tracing();
    let repository = Repository::<_, Person>::new(InMemoryStore::new());
    for i in 0..25 {
        repository.save(&Person::new(&format!("person-{i:02}"), i)).await.unwrap();
    }

    let first = repository
        .paginate(&PageRequest::new(0, 10), &doc! {}, &no_or())
        .await
        .unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].name, "person-00");
    assert_eq!(first[9].name, "person-09");

    // Writes between requests must not shift the next page.
    repository.delete(&first[0]).await.unwrap();
    repository.save(&Person::new("late", 99)).await.unwrap();

    let next = PageRequest::builder()
        .with_page(1)
        .with_page_size(10)
        .with_last_entity(first.last())
        .build();
    let second = repository.paginate(&next, &doc! {}, &no_or()).await.unwrap();

    let expected: Vec<String> = (10..20).map(|i| format!("person-{i:02}")).collect();
    assert_eq!(names(&second), expected);

    let last = PageRequest::builder()
        .with_page(2)
        .with_page_size(10)
        .with_last_entity(second.last())
        .build();
    let third = repository.paginate(&last, &doc! {}, &no_or()).await.unwrap();

    let mut expected: Vec<String> = (20..25).map(|i| format!("person-{i:02}")).collect();
    expected.push("late".into());
    assert_eq!(names(&third), expected);
}

#[tokio::test]
async fn cursor_combines_with_filters() {
    let repository = seeded(&[("Ann", 1), ("Bob", 2), ("Anna", 3), ("Cid", 4), ("joanne", 5)]).await;
    let filters = doc! { "name": "ann" };

    let first = repository
        .paginate(&PageRequest::new(0, 2), &filters, &no_or())
        .await
        .unwrap();
    let next = PageRequest::builder()
        .with_page(1)
        .with_page_size(2)
        .with_last_entity(first.last())
        .build();
    let second = repository.paginate(&next, &filters, &no_or()).await.unwrap();

    assert_eq!(names(&first), ["Ann", "Anna"]);
    assert_eq!(names(&second), ["joanne"]);
    // The caller's filter map is left untouched.
    assert_eq!(filters, doc! { "name": "ann" });
}

#[tokio::test]
async fn cursor_is_ignored_on_first_page() {
    let repository = seeded(&[("Ann", 1), ("Bob", 2)]).await;
    let all = repository.find_all().await.unwrap();

    let request = PageRequest::builder()
        .with_page(0)
        .with_page_size(10)
        .with_last_entity(all.last())
        .build();
    let page = repository.paginate(&request, &doc! {}, &no_or()).await.unwrap();

    assert_eq!(names(&page), ["Ann", "Bob"]);
}

#[tokio::test]
async fn explicit_cursor_in_filters_accepts_hex_identifiers() {
    let repository = seeded(&[("Ann", 1), ("Bob", 2), ("Cid", 3)]).await;
    let ann = repository.find_all().await.unwrap().remove(0);
    let after = ann.id.unwrap().to_hex();

    let page = repository
        .paginate(&PageRequest::new(0, 10), &doc! { CURSOR_KEY: after }, &no_or())
        .await
        .unwrap();

    assert_eq!(names(&page), ["Bob", "Cid"]);
}

#[tokio::test]
async fn malformed_cursor_is_rejected() {
    let repository = seeded(&[("Ann", 1)]).await;

    let err = repository
        .paginate(&PageRequest::new(0, 10), &doc! { CURSOR_KEY: "not-an-id" }, &no_or())
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::InvalidCursor(_)));
}

#[tokio::test]
async fn empty_page_size_returns_nothing() {
    let repository = seeded(&[("Ann", 1), ("Bob", 2)]).await;

    let page = repository
        .paginate(&PageRequest::new(0, 0), &doc! {}, &no_or())
        .await
        .unwrap();

    assert!(page.is_empty());
}

#[tokio::test]
async fn pages_can_be_sorted_by_field() {
    let repository = seeded(&[("Ann", 30), ("Bob", 50), ("Cid", 40)]).await;

    let request = PageRequest::builder().with_sort("age", false).build();
    let page = repository.paginate(&request, &doc! {}, &no_or()).await.unwrap();

    assert_eq!(names(&page), ["Bob", "Cid", "Ann"]);
}

#[tokio::test]
async fn count_agrees_with_client_side_filtering() {
    let repository = seeded(&[("Ann", 30), ("Bob", 30), ("Anna", 41), ("joanne", 30), ("Rob", 9)]).await;

    let counted = repository.count(&doc! { "name": "o" }, &no_or()).await.unwrap();
    let expected = repository
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains('o'))
        .count();

    assert_eq!(counted, expected as u64);
    assert_eq!(repository.count(&doc! {}, &no_or()).await.unwrap(), 5);
}

#[tokio::test]
async fn find_one_returns_first_match_in_storage_order() {
    let repository = seeded(&[("Bob", 1), ("Ann", 2), ("Anna", 3)]).await;

    let found = repository.find_one(&doc! { "name": "an" }, &no_or()).await.unwrap();

    assert_eq!(found.map(|p| p.name), Some("Ann".to_string()));
}

#[tokio::test]
async fn find_one_without_match_is_none() {
    let repository = seeded(&[("Ann", 1)]).await;

    let found = repository.find_one(&doc! { "name": "zed" }, &no_or()).await.unwrap();

    assert_eq!(found, None);
}

#[tokio::test]
async fn or_filters_are_not_applied() {
    let repository = seeded(&[("Ann", 1), ("Bob", 2), ("Cid", 3)]).await;
    let or = OrFilters::from([("name".to_string(), vec![Bson::String("bob".into())])]);

    assert_eq!(repository.count(&doc! {}, &or).await.unwrap(), 3);
    assert_eq!(
        names(&repository.paginate(&PageRequest::new(0, 10), &doc! {}, &or).await.unwrap()),
        ["Ann", "Bob", "Cid"]
    );
    assert_eq!(
        repository.find_one(&doc! {}, &or).await.unwrap().map(|p| p.name),
        Some("Ann".to_string())
    );
}

#[tokio::test]
async fn store_hands_out_repositories_per_collection() {
    init_tracing();
    let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap());

    store.repository::<Person>().save(&Person::new("Ann", 30)).await.unwrap();
    store
        .repository::<Note>()
        .save(&Note { id: None, text: "hello".into() })
        .await
        .unwrap();
    store
        .repository::<Note>()
        .save(&Note { id: None, text: "world".into() })
        .await
        .unwrap();

    assert_eq!(store.repository::<Person>().count(&doc! {}, &no_or()).await.unwrap(), 1);
    assert_eq!(store.repository::<Note>().count(&doc! {}, &no_or()).await.unwrap(), 2);
    assert_eq!(
        store
            .backend()
            .count_documents("people", Filter::eq("name", "Ann"))
            .await
            .unwrap(),
        1
    );

    store.shutdown().await.unwrap();
}
