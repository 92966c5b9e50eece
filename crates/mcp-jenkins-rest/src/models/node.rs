use serde::{
    Deserialize,
    Serialize,
};

/// A controller or agent, from `computer/{name}/api/json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub display_name: String,
    pub offline: bool,
    #[serde(default)]
    pub executors: Vec<NodeExecutor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutor {
    /// The build occupying this executor; `None` when idle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_executable: Option<NodeExecutorCurrentExecutable>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutorCurrentExecutable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_display_name: Option<String>,
}
