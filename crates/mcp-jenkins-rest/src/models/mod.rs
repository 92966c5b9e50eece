//! Response models for the Jenkins JSON API

mod build;
mod item;
mod node;
mod queue;

pub use build::{
    Build,
    BuildReplay,
    BuildType,
};
pub use item::{
    Folder,
    Item,
    ItemInfo,
    ItemKind,
    Job,
    UnknownItem,
};
pub use node::{
    Node,
    NodeExecutor,
    NodeExecutorCurrentExecutable,
};
pub use queue::{
    Queue,
    QueueItem,
    QueueItemTask,
};

use serde::Deserialize;

/// Body of `crumbIssuer/api/json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Crumb {
    pub crumb_request_field: String,
    pub crumb: String,
}

/// Body of `computer/api/json`
#[derive(Debug, Deserialize)]
pub(crate) struct NodesResponse {
    #[serde(default)]
    pub computer: Vec<Node>,
}

/// Body of the item tree query
#[derive(Debug, Deserialize)]
pub(crate) struct ItemsResponse {
    #[serde(default)]
    pub jobs: Vec<Item>,
}
