//! Resource-oriented view over a [`JenkinsRestClient`]

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::client::{
    ClientOptions,
    JenkinsRestClient,
};
use crate::error::JenkinsResult;
use crate::models::{
    Build,
    BuildReplay,
    BuildType,
    Item,
    Node,
    Queue,
    QueueItem,
};

/// One Jenkins session split into `job`, `build`, `node` and `queue_item`
/// handles. All four share the same client and its crumb cache.
#[derive(Debug, Clone)]
pub struct Jenkins {
    pub job: JobResource,
    pub build: BuildResource,
    pub node: NodeResource,
    pub queue_item: QueueItemResource,
    client: Arc<JenkinsRestClient>,
}

impl Jenkins {
    pub fn new(client: JenkinsRestClient) -> Self {
        Self::from_shared(Arc::new(client))
    }

    pub fn from_shared(client: Arc<JenkinsRestClient>) -> Self {
        Self {
            job: JobResource {
                client: Arc::clone(&client),
            },
            build: BuildResource {
                client: Arc::clone(&client),
            },
            node: NodeResource {
                client: Arc::clone(&client),
            },
            queue_item: QueueItemResource {
                client: Arc::clone(&client),
            },
            client,
        }
    }

    pub fn connect(
        url: &str, username: impl Into<String>, password: impl Into<String>,
        options: ClientOptions,
    ) -> JenkinsResult<Self> {
        JenkinsRestClient::new(url, username, password, options).map(Self::new)
    }

    /// The underlying client, for calls the resource handles do not cover
    pub fn client(&self) -> &JenkinsRestClient {
        &self.client
    }
}

#[derive(Debug, Clone)]
pub struct JobResource {
    client: Arc<JenkinsRestClient>,
}

impl JobResource {
    pub async fn get_all(&self) -> JenkinsResult<Vec<Item>> {
        self.client.get_items().await
    }

    pub async fn get_tree(&self) -> JenkinsResult<Vec<Item>> {
        self.client.get_item_tree().await
    }

    pub async fn get(&self, fullname: &str, depth: u32) -> JenkinsResult<Item> {
        self.client.get_item(fullname, depth).await
    }

    pub async fn get_config(&self, fullname: &str) -> JenkinsResult<String> {
        self.client.get_item_config(fullname).await
    }

    pub async fn update_config(&self, fullname: &str, config: &str) -> JenkinsResult<()> {
        self.client.update_item_config(fullname, config).await
    }

    pub async fn query(
        &self, class_pattern: Option<&str>, fullname_pattern: Option<&str>,
        color_pattern: Option<&str>,
    ) -> JenkinsResult<Vec<Item>> {
        self.client
            .query_items(class_pattern, fullname_pattern, color_pattern)
            .await
    }

    pub async fn build(
        &self, fullname: &str, build_type: BuildType, params: Option<&BTreeMap<String, String>>,
    ) -> JenkinsResult<u64> {
        self.client.build_item(fullname, build_type, params).await
    }
}

#[derive(Debug, Clone)]
pub struct BuildResource {
    client: Arc<JenkinsRestClient>,
}

impl BuildResource {
    pub async fn get(&self, fullname: &str, number: u64, depth: u32) -> JenkinsResult<Build> {
        self.client.get_build(fullname, number, depth).await
    }

    pub async fn get_last(&self, fullname: &str, depth: u32) -> JenkinsResult<Build> {
        self.client.get_last_build(fullname, depth).await
    }

    pub async fn get_console_output(&self, fullname: &str, number: u64) -> JenkinsResult<String> {
        self.client.get_build_console_output(fullname, number).await
    }

    pub async fn get_replay(&self, fullname: &str, number: u64) -> JenkinsResult<BuildReplay> {
        self.client.get_build_replay(fullname, number).await
    }

    pub async fn get_test_report(
        &self, fullname: &str, number: u64, depth: u32,
    ) -> JenkinsResult<serde_json::Value> {
        self.client
            .get_build_test_report(fullname, number, depth)
            .await
    }

    pub async fn get_running(&self) -> JenkinsResult<Vec<Build>> {
        self.client.get_running_builds().await
    }

    pub async fn stop(&self, fullname: &str, number: u64) -> JenkinsResult<()> {
        self.client.stop_build(fullname, number).await
    }
}

#[derive(Debug, Clone)]
pub struct NodeResource {
    client: Arc<JenkinsRestClient>,
}

impl NodeResource {
    pub async fn get(&self, name: &str, depth: u32) -> JenkinsResult<Node> {
        self.client.get_node(name, depth).await
    }

    pub async fn get_all(&self, depth: u32) -> JenkinsResult<Vec<Node>> {
        self.client.get_nodes(depth).await
    }

    pub async fn get_config(&self, name: &str) -> JenkinsResult<String> {
        self.client.get_node_config(name).await
    }
}

#[derive(Debug, Clone)]
pub struct QueueItemResource {
    client: Arc<JenkinsRestClient>,
}

impl QueueItemResource {
    pub async fn get_all(&self, depth: u32) -> JenkinsResult<Queue> {
        self.client.get_queue(depth).await
    }

    pub async fn get(&self, id: u64, depth: u32) -> JenkinsResult<QueueItem> {
        self.client.get_queue_item(id, depth).await
    }

    pub async fn cancel(&self, id: u64) -> JenkinsResult<()> {
        self.client.cancel_queue_item(id).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{
        method,
        path,
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    #[tokio::test]
    async fn test_resources_share_one_crumb() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crumbIssuer/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "crumb": "crumb-value",
                "crumbRequestField": "Jenkins-Crumb"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/computer/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "computer": [] })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/queue/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
            .mount(&server)
            .await;

        let jenkins =
            Jenkins::connect(&server.uri(), "username", "password", ClientOptions::default())
                .unwrap();

        assert!(jenkins.node.get_all(0).await.unwrap().is_empty());
        assert!(jenkins.queue_item.get_all(1).await.unwrap().items.is_empty());
        assert!(jenkins.build.get_running().await.unwrap().is_empty());
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(Jenkins::connect("", "username", "password", ClientOptions::default()).is_err());
    }
}
