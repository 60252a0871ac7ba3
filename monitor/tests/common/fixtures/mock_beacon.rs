//! Mock consensus client (beacon node API)

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub struct MockBeaconServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockBeaconServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// `/eth/v1/node/health` answers with an empty body and `status`
    pub async fn mock_health(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/eth/v1/node/health"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_syncing(&self, head_slot: u64, sync_distance: u64, is_syncing: bool) {
        Mock::given(method("GET"))
            .and(path("/eth/v1/node/syncing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "head_slot": head_slot.to_string(),
                    "sync_distance": sync_distance.to_string(),
                    "is_syncing": is_syncing,
                    "is_optimistic": false,
                    "el_offline": false
                }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_version(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/eth/v1/node/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "version": version }
            })))
            .mount(&self.server)
            .await;
    }
}
