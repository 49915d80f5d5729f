use likesync::{management::{TokenManager, token_from_response}, types::Token};
use serde_json::json;

fn token(obtained_at: u64, expires_in: u64) -> Token {
    Token {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        scope: "likes".to_string(),
        expires_in,
        obtained_at,
    }
}

#[test]
fn test_token_expiry_margin() {
    let mgr = TokenManager::with_path(token(1_000, 3_600), "unused.json".into());

    assert!(!mgr.is_expired_at(1_000));
    assert!(!mgr.is_expired_at(4_359));
    // within four minutes of expiry
    assert!(mgr.is_expired_at(4_360));
    assert!(mgr.is_expired_at(10_000));
}

#[test]
fn test_token_from_response() {
    let parsed = token_from_response(
        &json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "scope": "likes",
            "expires_in": 1800
        }),
        None,
    )
    .unwrap();

    assert_eq!(parsed.access_token, "a1");
    assert_eq!(parsed.refresh_token, "r1");
    assert_eq!(parsed.expires_in, 1800);
}

#[test]
fn test_refresh_response_keeps_previous_refresh_token() {
    let parsed = token_from_response(&json!({ "access_token": "a2" }), Some("r1")).unwrap();

    assert_eq!(parsed.refresh_token, "r1");
    assert_eq!(parsed.expires_in, 3600);
}

#[test]
fn test_response_without_access_token_is_rejected() {
    assert!(token_from_response(&json!({ "error": "invalid_grant" }), None).is_err());
}

#[tokio::test]
async fn test_token_persist_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache/token.json");

    TokenManager::with_path(token(42, 3_600), path.clone())
        .persist()
        .await
        .unwrap();
    let loaded = TokenManager::load_from(path).await.unwrap();

    assert_eq!(loaded.current_token().access_token, "access");
    assert_eq!(loaded.current_token().obtained_at, 42);
}

#[tokio::test]
async fn test_missing_token_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(TokenManager::load_from(dir.path().join("token.json")).await.is_err());
}
