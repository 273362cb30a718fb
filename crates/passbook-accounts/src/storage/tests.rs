//! Storage layer tests.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::db::{AccountsDatabase, DatabaseError};
use super::models::{RefreshToken, User};

async fn test_db() -> AccountsDatabase {
    AccountsDatabase::open_in_memory().await.unwrap()
}

fn alice() -> User {
    User::new(
        "Alice".into(),
        "Doe".into(),
        "alice@example.com".into(),
        Some("alice".into()),
        "hash123".into(),
        Utc::now(),
    )
}

fn ledger_row(user_id: &str) -> RefreshToken {
    let now = Utc::now();
    RefreshToken {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        fingerprint: "1.2.3.4:abcdef0123456789".into(),
        created_at: now,
        expires_at: now + Duration::days(15),
        revoked: false,
    }
}

// === User tests ===

#[tokio::test]
async fn add_and_get_user() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = db.begin().await.unwrap();
    let found = uow.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(found.email, "alice@example.com");
    assert_eq!(found.username.as_deref(), Some("alice"));
    assert!(found.is_active);
    assert!(!found.is_verified);
    assert!(found.last_login_at.is_none());
}

#[tokio::test]
async fn get_user_by_email_and_username() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();

    assert!(
        uow.get_user_by_email("alice@example.com")
            .await
            .unwrap()
            .is_some()
    );
    assert!(uow.get_user_by_email("bob@example.com").await.unwrap().is_none());
    assert!(uow.get_user_by_username("alice").await.unwrap().is_some());
    assert!(uow.get_user_by_username("bob").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let db = test_db().await;

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&alice()).await.unwrap();

    let mut duplicate = alice();
    duplicate.username = Some("alice2".into());
    let err = uow.add_user(&duplicate).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)));
}

#[tokio::test]
async fn update_persists_state_transitions() {
    let db = test_db().await;
    let mut user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();

    let later = Utc::now() + Duration::seconds(5);
    user.verify_email(later);
    user.deactivate(later);
    user.record_login(later);
    uow.update_user(&user).await.unwrap();
    uow.commit().await.unwrap();

    let mut uow = db.begin().await.unwrap();
    let found = uow.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert!(found.is_verified);
    assert!(!found.is_active);
    assert!(found.last_login_at.is_some());
    assert_eq!(found.updated_at.timestamp(), later.timestamp());
}

#[tokio::test]
async fn remove_user_reports_whether_it_deleted() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();
    assert!(uow.remove_user(&user.id).await.unwrap());
    assert!(!uow.remove_user(&user.id).await.unwrap());
    assert!(uow.get_user_by_id(&user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn list_users_filters_inactive() {
    let db = test_db().await;

    let mut uow = db.begin().await.unwrap();
    let mut bob = User::new(
        "Bob".into(),
        "Roe".into(),
        "bob@example.com".into(),
        None,
        "hash".into(),
        Utc::now(),
    );
    bob.deactivate(Utc::now());
    uow.add_user(&alice()).await.unwrap();
    uow.add_user(&bob).await.unwrap();

    assert_eq!(uow.list_users(false).await.unwrap().len(), 2);

    let active = uow.list_users(true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].email, "alice@example.com");
}

#[tokio::test]
async fn file_database_persists_across_reopens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.db");
    let user = alice();

    {
        let db = AccountsDatabase::open(&path).await.unwrap();
        let mut uow = db.begin().await.unwrap();
        uow.add_user(&user).await.unwrap();
        uow.commit().await.unwrap();
    }

    let db = AccountsDatabase::open(&path).await.unwrap();
    let mut uow = db.begin().await.unwrap();
    assert!(uow.get_user_by_id(&user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn dropping_a_unit_of_work_rolls_back() {
    let db = test_db().await;
    let user = alice();

    {
        let mut uow = db.begin().await.unwrap();
        uow.add_user(&user).await.unwrap();
        // dropped without commit
    }

    let mut uow = db.begin().await.unwrap();
    assert!(uow.get_user_by_id(&user.id).await.unwrap().is_none());
}

// === Refresh-token ledger tests ===

#[tokio::test]
async fn add_and_get_refresh_token() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();

    let row = ledger_row(&user.id);
    uow.add_refresh_token(&row).await.unwrap();

    let found = uow.get_refresh_token(&row.id).await.unwrap().unwrap();
    assert_eq!(found.user_id, user.id);
    assert_eq!(found.jti, row.jti);
    assert_eq!(found.fingerprint, row.fingerprint);
    assert!(!found.revoked);

    assert!(uow.get_refresh_token("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn colliding_ledger_id_is_a_conflict() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();

    let row = ledger_row(&user.id);
    uow.add_refresh_token(&row).await.unwrap();

    let mut collision = ledger_row(&user.id);
    collision.id = row.id.clone();
    let err = uow.add_refresh_token(&collision).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)));
}

#[tokio::test]
async fn revoke_flips_exactly_once() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();

    let row = ledger_row(&user.id);
    uow.add_refresh_token(&row).await.unwrap();

    assert!(uow.revoke_refresh_token(&row.id).await.unwrap());
    // second revocation is a no-op, not an error
    assert!(!uow.revoke_refresh_token(&row.id).await.unwrap());

    let found = uow.get_refresh_token(&row.id).await.unwrap().unwrap();
    assert!(found.revoked);
}

#[tokio::test]
async fn removing_a_user_cascades_to_ledger_rows() {
    let db = test_db().await;
    let user = alice();

    let mut uow = db.begin().await.unwrap();
    uow.add_user(&user).await.unwrap();
    let row = ledger_row(&user.id);
    uow.add_refresh_token(&row).await.unwrap();

    uow.remove_user(&user.id).await.unwrap();
    assert!(uow.get_refresh_token(&row.id).await.unwrap().is_none());
}
