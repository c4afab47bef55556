//! Fake Graph directory for integration tests.

#![allow(dead_code)]

use b2c_graph::{GraphCloud, GraphConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "contoso-tenant";
pub const DOMAIN: &str = "contoso.onmicrosoft.com";
pub const TOKEN_PATH: &str = "/contoso-tenant/oauth2/v2.0/token";

/// Config pointing both the identity platform and Graph at `server`, with no
/// backoff between retries.
pub fn test_config(server: &MockServer) -> GraphConfig {
    GraphConfig::new(TENANT, "app-id", "app-secret")
        .with_retry_delay_ms(0)
        .with_cloud(GraphCloud::Custom {
            login_endpoint: server.uri(),
            graph_endpoint: server.uri(),
        })
}

pub fn token_response(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3599
    })
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response("test-token")))
        .mount(server)
        .await;
}

pub async fn mount_domains(server: &MockServer, domains: &[&str]) {
    let items = domains
        .iter()
        .enumerate()
        .map(|(i, d)| json!({"id": d, "isDefault": i == 0, "isVerified": true}))
        .collect();

    Mock::given(method("GET"))
        .and(path("/v1.0/domains"))
        .respond_with(ResponseTemplate::new(200).set_body_json(odata_page(items, None)))
        .mount(server)
        .await;
}

/// Server with a working token endpoint and one domain.
pub async fn start_directory() -> MockServer {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_domains(&server, &[DOMAIN]).await;
    server
}

pub fn odata_page(items: Vec<Value>, next_link: Option<&str>) -> Value {
    let mut page = json!({ "value": items });
    if let Some(link) = next_link {
        page["@odata.nextLink"] = json!(link);
    }
    page
}

pub fn odata_error(code: &str, message: &str) -> Value {
    json!({
        "error": {
            "code": code,
            "message": message,
            "innerError": {"date": "2024-01-15T00:00:00", "request-id": "test"}
        }
    })
}

pub fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(odata_error(
        "Request_ResourceNotFound",
        "Resource does not exist or one of its queried reference-property objects are not present.",
    ))
}

pub fn user_json(id: &str, upn: &str) -> Value {
    json!({
        "id": id,
        "userPrincipalName": upn,
        "displayName": format!("Test User {id}"),
        "accountEnabled": true
    })
}

pub fn group_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "displayName": name,
        "mailNickname": name,
        "mailEnabled": false,
        "securityEnabled": true,
        "groupTypes": []
    })
}
