//! The tools exposed to MCP clients and their dispatch onto [`Jenkins`]
//!
//! Each tool carries a `read` or `write` tag. In read-only mode the write
//! tools are left out of the catalog entirely, so they can neither be
//! listed nor called. Exposed names come from the configured alias, where
//! `[fn]` stands for the tool's own name.

use std::collections::BTreeMap;
use std::fmt;

use mcp_jenkins_rest::{
    BuildType,
    Jenkins,
};
use serde::de::DeserializeOwned;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use tracing::debug;

use crate::error::{
    CoreError,
    CoreResult,
};
use crate::settings::{
    JenkinsSettings,
    TOOL_NAME_PLACEHOLDER,
};

const DEFAULT_DEPTH: u32 = 0;
const DEFAULT_QUEUE_DEPTH: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolTag {
    Read,
    Write,
}

impl fmt::Display for ToolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolTag::Read => f.write_str("read"),
            ToolTag::Write => f.write_str("write"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    GetAllItems,
    GetItem,
    GetItemConfig,
    QueryItems,
    UpdateItemConfig,
    BuildItem,
    GetBuild,
    GetBuildConsoleOutput,
    GetBuildReplay,
    GetBuildTestReport,
    GetRunningBuilds,
    StopBuild,
    GetAllQueueItems,
    GetQueueItem,
    CancelQueueItem,
    GetNode,
    GetAllNodes,
    GetNodeConfig,
}

impl Tool {
    pub const ALL: [Tool; 18] = [
        Tool::GetAllItems,
        Tool::GetItem,
        Tool::GetItemConfig,
        Tool::QueryItems,
        Tool::UpdateItemConfig,
        Tool::BuildItem,
        Tool::GetBuild,
        Tool::GetBuildConsoleOutput,
        Tool::GetBuildReplay,
        Tool::GetBuildTestReport,
        Tool::GetRunningBuilds,
        Tool::StopBuild,
        Tool::GetAllQueueItems,
        Tool::GetQueueItem,
        Tool::CancelQueueItem,
        Tool::GetNode,
        Tool::GetAllNodes,
        Tool::GetNodeConfig,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::GetAllItems => "get_all_items",
            Tool::GetItem => "get_item",
            Tool::GetItemConfig => "get_item_config",
            Tool::QueryItems => "query_items",
            Tool::UpdateItemConfig => "update_item_config",
            Tool::BuildItem => "build_item",
            Tool::GetBuild => "get_build",
            Tool::GetBuildConsoleOutput => "get_build_console_output",
            Tool::GetBuildReplay => "get_build_replay",
            Tool::GetBuildTestReport => "get_build_test_report",
            Tool::GetRunningBuilds => "get_running_builds",
            Tool::StopBuild => "stop_build",
            Tool::GetAllQueueItems => "get_all_queue_items",
            Tool::GetQueueItem => "get_queue_item",
            Tool::CancelQueueItem => "cancel_queue_item",
            Tool::GetNode => "get_node",
            Tool::GetAllNodes => "get_all_nodes",
            Tool::GetNodeConfig => "get_node_config",
        }
    }

    pub fn tag(&self) -> ToolTag {
        match self {
            Tool::UpdateItemConfig | Tool::BuildItem | Tool::StopBuild | Tool::CancelQueueItem => {
                ToolTag::Write
            }
            _ => ToolTag::Read,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::GetAllItems => "Get all items (jobs and folders) from Jenkins, flattened",
            Tool::GetItem => "Get a specific item by its full name",
            Tool::GetItemConfig => "Get the config.xml of an item",
            Tool::QueryItems => {
                "Query items by regex patterns on class, full name and color; all given patterns must match"
            }
            Tool::UpdateItemConfig => "Replace the config.xml of an item",
            Tool::BuildItem => {
                "Trigger a build; jobs with parameters need build_type 'buildWithParameters'. Returns the queue item id"
            }
            Tool::GetBuild => "Get a build, or the last build when no number is given",
            Tool::GetBuildConsoleOutput => "Get the console output of a build",
            Tool::GetBuildReplay => "Get the pipeline scripts of a build from its replay page",
            Tool::GetBuildTestReport => "Get the test report of a build",
            Tool::GetRunningBuilds => "Get all builds currently running on any node",
            Tool::StopBuild => "Stop a running build",
            Tool::GetAllQueueItems => "Get all items waiting in the build queue",
            Tool::GetQueueItem => "Get a specific queue item by id",
            Tool::CancelQueueItem => "Cancel a queue item by id",
            Tool::GetNode => "Get a node by name",
            Tool::GetAllNodes => "Get all nodes",
            Tool::GetNodeConfig => "Get the config.xml of a node",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

/// A tool as presented to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolEntry {
    pub name: String,
    #[serde(skip)]
    pub tool: Tool,
    pub tag: ToolTag,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct ToolCatalog {
    entries: Vec<ToolEntry>,
}

impl ToolCatalog {
    pub fn new(settings: &JenkinsSettings) -> Self {
        let entries = Tool::ALL
            .into_iter()
            .filter(|tool| !(settings.read_only && tool.tag() == ToolTag::Write))
            .map(|tool| ToolEntry {
                name: alias(&settings.tool_alias, tool.name()),
                tool,
                tag: tool.tag(),
                description: tool.description(),
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[ToolEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Runs the tool exposed as `name` and returns its result as plain
    /// JSON, with absent optional fields left out.
    pub async fn call(&self, jenkins: &Jenkins, name: &str, args: Value) -> CoreResult<Value> {
        let entry = self
            .get(name)
            .ok_or_else(|| CoreError::ToolNotFound(name.to_string()))?;

        debug!(tool = entry.tool.name(), exposed_as = %entry.name, "Calling tool");
        dispatch(jenkins, entry.tool, args).await
    }
}

fn alias(pattern: &str, name: &str) -> String {
    pattern.replace(TOOL_NAME_PLACEHOLDER, name)
}

#[derive(Debug, Deserialize)]
struct ItemArgs {
    fullname: String,
    depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ItemConfigArgs {
    fullname: String,
}

#[derive(Debug, Deserialize)]
struct UpdateItemConfigArgs {
    fullname: String,
    config_xml: String,
}

#[derive(Debug, Default, Deserialize)]
struct QueryItemsArgs {
    class_pattern: Option<String>,
    fullname_pattern: Option<String>,
    color_pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BuildItemArgs {
    fullname: String,
    #[serde(default)]
    build_type: BuildType,
    params: Option<BTreeMap<String, Value>>,
}

/// Build parameters as query values. Strings pass through unquoted, other
/// values use their JSON text, and nulls are dropped.
fn query_params(params: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    params
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct BuildArgs {
    fullname: String,
    number: Option<u64>,
    depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TestReportArgs {
    fullname: String,
    number: u64,
    depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct BuildNumberArgs {
    fullname: String,
    number: u64,
}

#[derive(Debug, Default, Deserialize)]
struct DepthArgs {
    depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct QueueItemArgs {
    id: u64,
    depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NodeArgs {
    name: String,
    depth: Option<u32>,
}

fn parse_args<T: DeserializeOwned>(tool: Tool, args: Value) -> CoreResult<T> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };

    serde_json::from_value(args).map_err(|e| CoreError::InvalidArguments {
        tool: tool.name().to_string(),
        message: e.to_string(),
    })
}

fn to_json<T: Serialize>(value: &T) -> CoreResult<Value> {
    Ok(serde_json::to_value(value)?)
}

async fn dispatch(jenkins: &Jenkins, tool: Tool, args: Value) -> CoreResult<Value> {
    match tool {
        Tool::GetAllItems => to_json(&jenkins.job.get_all().await?),
        Tool::GetItem => {
            let args: ItemArgs = parse_args(tool, args)?;
            let item = jenkins
                .job
                .get(&args.fullname, args.depth.unwrap_or(DEFAULT_DEPTH))
                .await?;
            to_json(&item)
        }
        Tool::GetItemConfig => {
            let args: ItemConfigArgs = parse_args(tool, args)?;
            Ok(Value::String(jenkins.job.get_config(&args.fullname).await?))
        }
        Tool::QueryItems => {
            let args: QueryItemsArgs = parse_args(tool, args)?;
            let items = jenkins
                .job
                .query(
                    args.class_pattern.as_deref(),
                    args.fullname_pattern.as_deref(),
                    args.color_pattern.as_deref(),
                )
                .await?;
            to_json(&items)
        }
        Tool::UpdateItemConfig => {
            let args: UpdateItemConfigArgs = parse_args(tool, args)?;
            jenkins
                .job
                .update_config(&args.fullname, &args.config_xml)
                .await?;
            Ok(Value::Null)
        }
        Tool::BuildItem => {
            let args: BuildItemArgs = parse_args(tool, args)?;
            let params = args.params.map(query_params);
            let queue_id = jenkins
                .job
                .build(&args.fullname, args.build_type, params.as_ref())
                .await?;
            Ok(Value::from(queue_id))
        }
        Tool::GetBuild => {
            let args: BuildArgs = parse_args(tool, args)?;
            let depth = args.depth.unwrap_or(DEFAULT_DEPTH);
            let build = match args.number {
                Some(number) => jenkins.build.get(&args.fullname, number, depth).await?,
                None => jenkins.build.get_last(&args.fullname, depth).await?,
            };
            to_json(&build)
        }
        Tool::GetBuildConsoleOutput => {
            let args: BuildNumberArgs = parse_args(tool, args)?;
            let output = jenkins
                .build
                .get_console_output(&args.fullname, args.number)
                .await?;
            Ok(Value::String(output))
        }
        Tool::GetBuildReplay => {
            let args: BuildNumberArgs = parse_args(tool, args)?;
            to_json(&jenkins.build.get_replay(&args.fullname, args.number).await?)
        }
        Tool::GetBuildTestReport => {
            let args: TestReportArgs = parse_args(tool, args)?;
            Ok(jenkins
                .build
                .get_test_report(&args.fullname, args.number, args.depth.unwrap_or(DEFAULT_DEPTH))
                .await?)
        }
        Tool::GetRunningBuilds => to_json(&jenkins.build.get_running().await?),
        Tool::StopBuild => {
            let args: BuildNumberArgs = parse_args(tool, args)?;
            jenkins.build.stop(&args.fullname, args.number).await?;
            Ok(Value::Null)
        }
        Tool::GetAllQueueItems => {
            let args: DepthArgs = parse_args(tool, args)?;
            let queue = jenkins
                .queue_item
                .get_all(args.depth.unwrap_or(DEFAULT_QUEUE_DEPTH))
                .await?;
            to_json(&queue.items)
        }
        Tool::GetQueueItem => {
            let args: QueueItemArgs = parse_args(tool, args)?;
            let item = jenkins
                .queue_item
                .get(args.id, args.depth.unwrap_or(DEFAULT_DEPTH))
                .await?;
            to_json(&item)
        }
        Tool::CancelQueueItem => {
            let args: QueueItemArgs = parse_args(tool, args)?;
            jenkins.queue_item.cancel(args.id).await?;
            Ok(Value::Null)
        }
        Tool::GetNode => {
            let args: NodeArgs = parse_args(tool, args)?;
            let node = jenkins
                .node
                .get(&args.name, args.depth.unwrap_or(DEFAULT_DEPTH))
                .await?;
            to_json(&node)
        }
        Tool::GetAllNodes => {
            let args: DepthArgs = parse_args(tool, args)?;
            to_json(&jenkins.node.get_all(args.depth.unwrap_or(DEFAULT_DEPTH)).await?)
        }
        Tool::GetNodeConfig => {
            let args: NodeArgs = parse_args(tool, args)?;
            Ok(Value::String(jenkins.node.get_config(&args.name).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use mcp_jenkins_rest::ClientOptions;
    use serde_json::json;
    use wiremock::matchers::{
        method,
        path,
        query_param,
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    fn catalog(read_only: bool, tool_alias: &str) -> ToolCatalog {
        ToolCatalog::new(&JenkinsSettings {
            read_only,
            tool_alias: tool_alias.to_string(),
            ..JenkinsSettings::default()
        })
    }

    async fn mock_jenkins() -> (MockServer, Jenkins) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/crumbIssuer/api/json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let jenkins =
            Jenkins::connect(&server.uri(), "username", "password", ClientOptions::default())
                .unwrap();
        (server, jenkins)
    }

    #[test]
    fn test_every_tool_name_round_trips() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("delete_everything"), None);
    }

    #[test]
    fn test_default_catalog_lists_everything() {
        let catalog = catalog(false, "[fn]");
        assert_eq!(catalog.entries().len(), Tool::ALL.len());
        assert_eq!(
            catalog.get("build_item").map(|entry| entry.tag),
            Some(ToolTag::Write)
        );
    }

    #[test]
    fn test_read_only_drops_write_tools() {
        let catalog = catalog(true, "[fn]");

        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        for write_tool in ["update_item_config", "build_item", "stop_build", "cancel_queue_item"] {
            assert!(!names.contains(&write_tool), "{write_tool} exposed in read-only mode");
        }
        assert_eq!(names.len(), 14);
        assert!(catalog
            .entries()
            .iter()
            .all(|entry| entry.tag == ToolTag::Read));
    }

    #[test]
    fn test_alias_renames_tools() {
        let catalog = catalog(false, "jenkins_[fn]");

        assert!(catalog.get("jenkins_get_item").is_some());
        assert!(catalog.get("get_item").is_none());
        assert_eq!(
            catalog.get("jenkins_get_item").map(|entry| entry.tool),
            Some(Tool::GetItem)
        );
    }

    #[tokio::test]
    async fn test_unknown_and_filtered_tools_are_not_found() {
        let (_server, jenkins) = mock_jenkins().await;
        let catalog = catalog(true, "[fn]");

        let err = catalog
            .call(&jenkins, "no_such_tool", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound(_)));

        let err = catalog
            .call(&jenkins, "stop_build", json!({ "fullname": "a", "number": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound(name) if name == "stop_build"));
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let (_server, jenkins) = mock_jenkins().await;
        let catalog = catalog(false, "[fn]");

        let err = catalog
            .call(&jenkins, "get_item", json!({ "depth": 1 }))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArguments { tool, .. } if tool == "get_item"));
    }

    #[tokio::test]
    async fn test_get_all_items_output_shape() {
        let (server, jenkins) = mock_jenkins().await;
        Mock::given(method("GET"))
            .and(path("/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jobs": [
                    {
                        "_class": "hudson.model.FreeStyleProject",
                        "name": "job",
                        "url": "https://example.com/job/job/",
                        "color": "blue"
                    },
                    {
                        "_class": "com.cloudbees.hudson.plugins.folder.Folder",
                        "name": "folder",
                        "url": "https://example.com/job/folder/",
                        "fullName": "folder",
                        "jobs": []
                    }
                ]
            })))
            .mount(&server)
            .await;

        let output = catalog(false, "[fn]")
            .call(&jenkins, "get_all_items", Value::Null)
            .await
            .unwrap();

        assert_eq!(
            output,
            json!([
                {
                    "_class": "hudson.model.FreeStyleProject",
                    "name": "job",
                    "url": "https://example.com/job/job/",
                    "color": "blue"
                },
                {
                    "_class": "com.cloudbees.hudson.plugins.folder.Folder",
                    "name": "folder",
                    "url": "https://example.com/job/folder/",
                    "fullName": "folder",
                    "jobs": []
                }
            ])
        );
    }

    #[tokio::test]
    async fn test_get_build_without_number_uses_last_build() {
        let (server, jenkins) = mock_jenkins().await;
        Mock::given(method("GET"))
            .and(path("/job/folder/job/job/lastBuild/api/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "number": 5,
                "url": "https://example.com/job/folder/job/job/5/",
                "building": true,
                "result": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = catalog(false, "[fn]")
            .call(&jenkins, "get_build", json!({ "fullname": "folder/job" }))
            .await
            .unwrap();

        assert_eq!(
            output,
            json!({
                "number": 5,
                "url": "https://example.com/job/folder/job/job/5/",
                "building": true
            })
        );
    }

    #[tokio::test]
    async fn test_build_item_returns_queue_id() {
        let (server, jenkins) = mock_jenkins().await;
        Mock::given(method("POST"))
            .and(path("/job/job/buildWithParameters"))
            .and(query_param("BRANCH", "main"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", "https://example.com/queue/item/123/"),
            )
            .mount(&server)
            .await;

        let output = catalog(false, "[fn]")
            .call(
                &jenkins,
                "build_item",
                json!({
                    "fullname": "job",
                    "build_type": "buildWithParameters",
                    "params": { "BRANCH": "main" }
                }),
            )
            .await
            .unwrap();

        assert_eq!(output, json!(123));
    }

    #[tokio::test]
    async fn test_build_item_accepts_non_string_params() {
        let (server, jenkins) = mock_jenkins().await;
        Mock::given(method("POST"))
            .and(path("/job/job/buildWithParameters"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", "https://example.com/queue/item/7/"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = catalog(false, "[fn]")
            .call(
                &jenkins,
                "build_item",
                json!({
                    "fullname": "job",
                    "build_type": "buildWithParameters",
                    "params": { "count": 3, "dry_run": true, "skipped": null }
                }),
            )
            .await
            .unwrap();
        assert_eq!(output, json!(7));

        let requests = server.received_requests().await.unwrap();
        let build = requests
            .iter()
            .find(|request| request.url.path() == "/job/job/buildWithParameters")
            .unwrap();
        assert_eq!(build.url.query(), Some("count=3&dry_run=true"));
    }

    #[test]
    fn test_query_params_stringify_scalars() {
        let params = BTreeMap::from([
            ("branch".to_string(), json!("main")),
            ("ratio".to_string(), json!(0.5)),
            ("tags".to_string(), json!(["a", "b"])),
        ]);
        assert_eq!(
            query_params(params),
            BTreeMap::from([
                ("branch".to_string(), "main".to_string()),
                ("ratio".to_string(), "0.5".to_string()),
                ("tags".to_string(), r#"["a","b"]"#.to_string()),
            ])
        );
    }

    #[tokio::test]
    async fn test_get_all_queue_items_defaults_to_depth_one() {
        let (server, jenkins) = mock_jenkins().await;
        Mock::given(method("GET"))
            .and(path("/queue/api/json"))
            .and(query_param("depth", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "discoverableItems": [],
                "items": [{
                    "id": 4,
                    "inQueueSince": 10,
                    "url": "queue/item/4/",
                    "task": { "name": "job" }
                }]
            })))
            .mount(&server)
            .await;

        let output = catalog(false, "[fn]")
            .call(&jenkins, "get_all_queue_items", json!({}))
            .await
            .unwrap();

        assert_eq!(
            output,
            json!([{
                "id": 4,
                "inQueueSince": 10,
                "url": "queue/item/4/",
                "task": { "name": "job" }
            }])
        );
    }

    #[tokio::test]
    async fn test_text_tools_return_strings() {
        let (server, jenkins) = mock_jenkins().await;
        Mock::given(method("GET"))
            .and(path("/computer/(master)/config.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<computer/>"))
            .mount(&server)
            .await;

        let output = catalog(false, "[fn]")
            .call(&jenkins, "get_node_config", json!({ "name": "Built-In Node" }))
            .await
            .unwrap();

        assert_eq!(output, json!("<computer/>"));
    }
}
