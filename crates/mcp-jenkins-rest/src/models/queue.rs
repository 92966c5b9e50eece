use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

/// The build queue as returned by `queue/api/json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    #[serde(default)]
    pub discoverable_items: Vec<Value>,
    #[serde(default)]
    pub items: Vec<QueueItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: u64,
    pub in_queue_since: i64,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why: Option<String>,
    pub task: QueueItemTask,
}

/// What a queue item will run. Jenkins fills these in lazily, so all of
/// them may be missing while the item is still waiting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
