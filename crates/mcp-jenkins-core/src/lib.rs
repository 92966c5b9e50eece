//! Glue between an MCP transport and the Jenkins REST client
//!
//! - [`JenkinsSettings`] - process configuration from `JENKINS_*` variables
//! - [`RequestCredentials`] / [`resolve_credentials`] - per-request
//!   `X-Jenkins-*` overrides
//! - [`ClientPool`] - one client per credential set
//! - [`ToolCatalog`] - tool names, read/write tags and dispatch

pub mod credentials;
pub mod logging;
pub mod pool;
pub mod settings;
pub mod tools;

mod error;

pub use credentials::{
    resolve_credentials,
    Credentials,
    RequestCredentials,
};
pub use error::{
    CoreError,
    CoreResult,
};
pub use pool::ClientPool;
pub use settings::JenkinsSettings;
pub use tools::{
    Tool,
    ToolCatalog,
    ToolEntry,
    ToolTag,
};
