//! Provider configuration and credential resolution against a mock Tozny API.

use serde_json::json;
use tozny_provider::{Provider, ProviderConfig, ProviderError};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn account_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        api_endpoint: server.uri(),
        account_username: Some("ops@example.com".into()),
        account_password: Some("hunter2".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_login_derives_provider_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/account/login"))
        .and(body_json(json!({
            "username": "ops@example.com",
            "password": "hunter2",
            "type": "password"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "account-token",
            "account_id": "acc-1",
            "config": {
                "version": 2,
                "api_url": "https://somewhere-else.example",
                "api_key_id": "key-id",
                "api_secret": "key-secret",
                "client_id": "client-1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::configure(account_config(&server)).await.unwrap();
    let client = provider.session().client().unwrap();
    assert_eq!(client.base_url(), server.uri());
    assert_eq!(client.credentials().client_id, "client-1");
    assert_eq!(client.credentials().account_username, "ops@example.com");
    assert_eq!(client.credentials().account_password, "hunter2");
}

#[tokio::test]
async fn test_failed_login_is_deferred_to_handlers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/account/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "invalid credentials"})),
        )
        .mount(&server)
        .await;

    let provider = Provider::configure(account_config(&server)).await.unwrap();
    assert!(!provider.session().is_configured());

    let err = provider
        .create(
            "tozny_realm_default_groups",
            &json!({"realm_name": "acme", "group_ids": ["g1"]}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotConfigured(_)));
    assert!(err.to_string().contains("invalid credentials"));
}

#[tokio::test]
async fn test_resource_credentials_work_without_provider_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "resource-token"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/identity/realm/acme/default_groups"))
        .and(body_json(json!({"groups": ["g1"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Provider::configure(ProviderConfig {
        api_endpoint: server.uri(),
        ..Default::default()
    })
    .await
    .unwrap();
    assert!(!provider.session().is_configured());

    let inline = json!({
        "api_url": server.uri(),
        "api_key_id": "resource-key",
        "api_secret": "resource-secret"
    })
    .to_string();
    let state = provider
        .create(
            "tozny_realm_default_groups",
            &json!({
                "realm_name": "Acme",
                "group_ids": ["g1"],
                "client_credentials_config": inline
            }),
        )
        .await
        .unwrap();
    assert_eq!(state["group_ids"], json!(["g1"]));
    assert_eq!(state["client_credentials_filepath"], "");
}

#[tokio::test]
async fn test_credentials_file_takes_precedence_over_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/account/login"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let creds_path = dir.path().join("tozny_client_credentials.json");
    std::fs::write(
        &creds_path,
        json!({
            "api_url": "https://api.e3db.com",
            "api_key_id": "file-key",
            "api_secret": "file-secret",
            "client_id": "file-client"
        })
        .to_string(),
    )
    .unwrap();

    let config = ProviderConfig {
        client_credentials_filepath: Some(creds_path.display().to_string()),
        ..account_config(&server)
    };
    let provider = Provider::configure(config).await.unwrap();
    let client = provider.session().client().unwrap();
    assert_eq!(client.credentials().client_id, "file-client");
    assert_eq!(client.base_url(), server.uri());
}

#[tokio::test]
async fn test_conflicting_credential_overrides_rejected() {
    let provider = Provider::configure(ProviderConfig::default()).await.unwrap();
    let err = provider
        .create(
            "tozny_realm_default_groups",
            &json!({
                "realm_name": "acme",
                "group_ids": [],
                "client_credentials_filepath": "/tmp/creds.json",
                "client_credentials_config": "{}"
            }),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Schema(_)));
}
