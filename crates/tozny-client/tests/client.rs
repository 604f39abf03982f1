//! HTTP level tests for the Tozny client against a mock server.

use serde_json::json;
use tozny_client::{
    AccessControlGroup, ClientCredentials, ClientError, Group, RealmSettingsUpdateRequest,
    RoleMapping, ToznyClient,
};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials(server: &MockServer) -> ClientCredentials {
    ClientCredentials {
        api_url: server.uri(),
        api_key_id: "key-id".into(),
        api_secret: "key-secret".into(),
        client_id: "client-1".into(),
        account_username: "ops@example.com".into(),
        account_password: "hunter2".into(),
        ..Default::default()
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "client-token",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_client_token_is_fetched_once_and_reused() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme"))
        .and(header("authorization", "Bearer client-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "acme",
            "domain": "acme.example",
            "active": true,
            "sovereign": {"id": 7, "name": "admin"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let realm = client.describe_realm("acme").await.unwrap();
    assert_eq!(realm.id, 42);
    assert_eq!(realm.sovereign.name, "admin");

    client.describe_realm("acme").await.unwrap();
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "stale-token"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh-token"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme"))
        .and(header("authorization", "Bearer stale-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme"))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "acme",
            "domain": "acme.example",
            "active": true,
            "sovereign": {"id": 7, "name": "admin"}
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    assert_eq!(client.describe_realm("acme").await.unwrap().id, 42);
    // The refreshed token is cached again.
    client.describe_realm("acme").await.unwrap();
}

#[tokio::test]
async fn test_repeated_401_is_returned_after_one_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "client-token"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "revoked"})))
        .expect(2)
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let err = client.describe_realm("acme").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 401, .. }));
}

#[tokio::test]
async fn test_not_found_is_distinguished() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme/group/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "group not found"})),
        )
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let err = client
        .describe_realm_group("acme", "missing")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("group not found"));
}

#[tokio::test]
async fn test_api_error_carries_status_and_message() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("PATCH"))
        .and(path("/v1/identity/realm/acme/settings"))
        .respond_with(ResponseTemplate::new(409).set_body_string("settings locked"))
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let err = client
        .update_realm_settings(
            "acme",
            &RealmSettingsUpdateRequest {
                mpc_enabled: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 409);
            assert_eq!(message, "settings locked");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_api_key_fails_before_any_request() {
    let server = MockServer::start().await;
    let client = ToznyClient::new(ClientCredentials {
        api_url: server.uri(),
        ..Default::default()
    })
    .unwrap();

    let err = client.describe_realm("acme").await.unwrap_err();
    assert!(matches!(err, ClientError::MissingCredentials(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_group_role_mappings_round_trip_over_http() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let mapping: RoleMapping = serde_json::from_value(json!({
        "client_roles": {
            "app-1": [{"id": "r-1", "name": "reader"}]
        },
        "realm_roles": [{"id": "r-9", "name": "admin"}]
    }))
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme/group/g-1/role_mapping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mapping))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/identity/realm/acme/group/g-1/role_mapping"))
        .and(body_json(json!({
            "realm_roles": [{"id": "r-9", "name": "admin", "description": "", "composite": false, "client_role": false}]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let observed = client.list_group_role_mappings("acme", "g-1").await.unwrap();
    assert_eq!(observed, mapping);

    let removal = RoleMapping {
        realm_roles: observed.realm_roles.clone(),
        ..Default::default()
    };
    client
        .remove_group_role_mappings("acme", "g-1", &removal)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_default_groups_replace_sends_full_list() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("PUT"))
        .and(path("/v1/identity/realm/acme/default_groups"))
        .and(body_json(json!({"groups": ["g-1", "g-2"]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/identity/realm/acme/default_groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [{"id": "g-2", "name": "staff"}, {"id": "g-3", "name": "ops"}]
        })))
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    client
        .replace_realm_default_groups("acme", &["g-1".to_string(), "g-2".to_string()])
        .await
        .unwrap();
    let groups = client.list_realm_default_groups("acme").await.unwrap();
    assert_eq!(groups.ids(), vec!["g-2", "g-3"]);
}

#[tokio::test]
async fn test_create_group_wraps_body() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/identity/realm/acme/group"))
        .and(body_json(json!({"group": {"name": "staff"}})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "g-1",
            "name": "staff",
            "path": "/staff"
        })))
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let group = client
        .create_realm_group(
            "acme",
            &Group {
                name: "staff".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(group.id, "g-1");
    assert_eq!(group.path, "/staff");
}

#[tokio::test]
async fn test_registration_tokens_use_account_session() {
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
            "account_id": "acct-1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/account/tokens"))
        .and(header("authorization", "Bearer account-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "ci", "token": "tok-1", "permissions": {"enabled": true, "one_time_use": false, "allowed_types": ["general"]}}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/account/tokens/tok-1"))
        .and(header("authorization", "Bearer account-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    let tokens = client.list_registration_tokens().await.unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].permissions.allowed_types, vec!["general"]);
    client.delete_registration_token("tok-1").await.unwrap();
}

#[tokio::test]
async fn test_access_control_group_updates() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let groups = vec![AccessControlGroup {
        id: "g-1".into(),
        extend_to_children: false,
    }];
    Mock::given(method("POST"))
        .and(path("/v1/identity/realm/acme/application/app-1/access_control/groups"))
        .and(body_json(json!({"groups": [{"id": "g-1", "extend_to_children": false}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/identity/realm/acme/application/app-1/access_control"))
        .and(body_json(json!({"enable": true})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = ToznyClient::new(credentials(&server)).unwrap();
    client
        .set_access_control("acme", "app-1", true)
        .await
        .unwrap();
    client
        .add_access_control_groups("acme", "app-1", &groups)
        .await
        .unwrap();
}
