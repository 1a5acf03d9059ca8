//! Integration tests for the account store and authentication service.

#[path = "test_utils/mod.rs"]
mod test_utils;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rentals::auth::{AuthError, TOKEN_TTL};
use rentals::error::RepositoryError;
use rentals::repositories::{AccountRepository, NewAccount};
use test_utils::{fast_auth_service, setup_test_db_arc};

const PASSWORD: &str = "Harvest#2025";

#[tokio::test]
async fn register_stores_a_salted_hash() {
    let db = setup_test_db_arc().await.unwrap();
    let auth = fast_auth_service(db);

    let account = auth
        .register(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            PASSWORD.to_string(),
        )
        .await
        .unwrap();

    assert_ne!(account.password_hash, PASSWORD);
    assert!(account.password_hash.starts_with("$argon2id$"));

    let stored = auth
        .accounts()
        .find_by_email("asha@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, account.id);
}

#[tokio::test]
async fn register_with_existing_email_is_rejected_once() {
    let db = setup_test_db_arc().await.unwrap();
    let auth = fast_auth_service(db);

    auth.register(
        "Asha".to_string(),
        "asha@example.com".to_string(),
        PASSWORD.to_string(),
    )
    .await
    .unwrap();

    let err = auth
        .register(
            "Someone Else".to_string(),
            "asha@example.com".to_string(),
            "Other#Pass1".to_string(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::Repository(RepositoryError::DuplicateEmail)
    ));

    let count = auth
        .accounts()
        .count_by_email("asha@example.com")
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unique_index_backs_the_duplicate_check() {
    let db = setup_test_db_arc().await.unwrap();
    let accounts = AccountRepository::new(db);
    let new_account = NewAccount {
        name: "Asha".to_string(),
        email: "asha@example.com".to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
    };

    accounts.create(new_account.clone()).await.unwrap();
    let err = accounts.create(new_account).await.unwrap_err();
    assert!(matches!(err, RepositoryError::DuplicateEmail));
}

#[tokio::test]
async fn authenticate_issues_a_one_hour_token() {
    let db = setup_test_db_arc().await.unwrap();
    let auth = fast_auth_service(db);
    let account = auth
        .register(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            PASSWORD.to_string(),
        )
        .await
        .unwrap();

    let issued = auth
        .authenticate("asha@example.com", PASSWORD.to_string())
        .await
        .unwrap();

    assert_eq!(issued.claims.id, account.id);
    assert_eq!(issued.claims.email, "asha@example.com");
    assert_eq!(issued.claims.exp - issued.claims.iat, TOKEN_TTL.num_seconds());

    let verified = auth.verify_token(&issued.token).unwrap();
    assert_eq!(verified, issued.claims);
}

#[tokio::test]
async fn wrong_password_and_unknown_email_fail_the_same_way() {
    let db = setup_test_db_arc().await.unwrap();
    let auth = fast_auth_service(db);
    auth.register(
        "Asha".to_string(),
        "asha@example.com".to_string(),
        PASSWORD.to_string(),
    )
    .await
    .unwrap();

    let wrong_password = auth
        .authenticate("asha@example.com", "Wrong#Pass1".to_string())
        .await
        .unwrap_err();
    assert!(matches!(wrong_password, AuthError::InvalidCredentials));

    let unknown_email = auth
        .authenticate("nobody@example.com", PASSWORD.to_string())
        .await
        .unwrap_err();
    assert!(matches!(unknown_email, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn expired_and_tampered_tokens_are_unauthenticated() {
    let db = setup_test_db_arc().await.unwrap();
    let auth = fast_auth_service(db);
    let account = auth
        .register(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            PASSWORD.to_string(),
        )
        .await
        .unwrap();

    let expired = auth
        .issue_token(&account, Utc::now() - Duration::minutes(61))
        .unwrap();
    assert!(matches!(
        auth.verify_token(&expired.token),
        Err(AuthError::Unauthenticated(_))
    ));

    // Swap the payload for one claiming another identity, keeping the signature.
    let valid = auth.issue_token(&account, Utc::now()).unwrap();
    let parts: Vec<&str> = valid.token.split('.').collect();
    let mut claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
    claims["email"] = "mallory@example.com".into();
    let tampered = format!(
        "{}.{}.{}",
        parts[0],
        URL_SAFE_NO_PAD.encode(claims.to_string()),
        parts[2]
    );
    assert!(matches!(
        auth.verify_token(&tampered),
        Err(AuthError::Unauthenticated(_))
    ));
}
