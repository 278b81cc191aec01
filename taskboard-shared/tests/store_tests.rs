/// Integration tests for accounts and the Postgres document store
///
/// Require PostgreSQL; see `common/mod.rs`.

mod common;

use serde_json::json;
use taskboard_shared::db::documents::PgDocumentStore;
use taskboard_shared::models::account::{Account, CreateAccount};
use taskboard_shared::models::document::Collection;
use taskboard_shared::models::task::TaskRecord;
use taskboard_shared::models::user::{AuthProvider, UserRecord};
use taskboard_shared::store::DocumentStore;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_account_email_is_case_insensitive_and_unique() {
    let pool = common::migrated_pool().await;
    let email = common::unique_email("Ada");

    let account = Account::create(
        &pool,
        CreateAccount {
            email: email.clone(),
            password_hash: Some("$argon2id$placeholder".to_string()),
            auth_provider: AuthProvider::Local,
            display_name: Some("Ada".to_string()),
        },
    )
    .await
    .expect("Failed to create account");

    let found = Account::find_by_email(&pool, &email.to_uppercase())
        .await
        .unwrap()
        .expect("Account should be found");
    assert_eq!(found.id, account.id);
    assert_eq!(found.provider(), AuthProvider::Local);

    let duplicate = Account::create(
        &pool,
        CreateAccount {
            email: email.to_lowercase(),
            password_hash: None,
            auth_provider: AuthProvider::Google,
            display_name: None,
        },
    )
    .await;
    assert!(duplicate.is_err(), "Duplicate email should violate the unique index");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_account_updates() {
    let pool = common::migrated_pool().await;

    let account = Account::create(
        &pool,
        CreateAccount {
            email: common::unique_email("reset"),
            password_hash: Some("old".to_string()),
            auth_provider: AuthProvider::Local,
            display_name: None,
        },
    )
    .await
    .unwrap();

    assert!(Account::update_password(&pool, account.id, "new").await.unwrap());
    assert!(Account::update_last_login(&pool, account.id).await.unwrap());
    assert!(!Account::update_password(&pool, Uuid::new_v4(), "x").await.unwrap());

    let reloaded = Account::find_by_id(&pool, account.id).await.unwrap().unwrap();
    assert_eq!(reloaded.password_hash.as_deref(), Some("new"));
    assert!(reloaded.last_login_at.is_some());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_document_lifecycle() {
    let store = PgDocumentStore::new(common::migrated_pool().await);
    let owner = Uuid::new_v4();

    let id = store
        .create_record(Collection::Tasks, TaskRecord::new("buy milk", owner).to_document())
        .await
        .unwrap();

    store
        .merge_record(
            Collection::Tasks,
            id,
            json!({"completed": true}).as_object().unwrap().clone(),
        )
        .await
        .unwrap();

    let stored = store.read_record(Collection::Tasks, id).await.unwrap().unwrap();
    let record = TaskRecord::from_document(&stored.data).unwrap();
    assert_eq!(record.text, "buy milk");
    assert!(record.completed);

    store.delete_record(Collection::Tasks, id).await.unwrap();
    store.delete_record(Collection::Tasks, id).await.unwrap();
    assert!(store.read_record(Collection::Tasks, id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_query_by_owner_in_creation_order() {
    let store = PgDocumentStore::new(common::migrated_pool().await);
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for (text, owner) in [("a1", alice), ("b1", bob), ("a2", alice)] {
        store
            .create_record(Collection::Tasks, TaskRecord::new(text, owner).to_document())
            .await
            .unwrap();
    }

    let results = store
        .query_records(Collection::Tasks, "uid", &json!(alice))
        .await
        .unwrap();

    let texts: Vec<String> = results
        .iter()
        .map(|d| TaskRecord::from_document(&d.data).unwrap().text)
        .collect();
    assert_eq!(texts, vec!["a1".to_string(), "a2".to_string()]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (DATABASE_URL)"]
async fn test_write_then_merge_user_document() {
    let store = PgDocumentStore::new(common::migrated_pool().await);
    let uid = Uuid::new_v4();

    let record = UserRecord::new(uid, Some("Ada".to_string()), "ada@example.com", AuthProvider::Local);
    store
        .write_record(Collection::Users, uid, record.to_document())
        .await
        .unwrap();

    store
        .merge_record(
            Collection::Users,
            uid,
            json!({"profileImage": "aGVsbG8="}).as_object().unwrap().clone(),
        )
        .await
        .unwrap();

    let stored = store.read_record(Collection::Users, uid).await.unwrap().unwrap();
    let user = UserRecord::from_document(&stored.data).unwrap();
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.profile_image.as_deref(), Some("aGVsbG8="));
}
