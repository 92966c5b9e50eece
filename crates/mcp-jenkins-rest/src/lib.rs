//! Typed client for the Jenkins REST API
//!
//! Provides:
//! - Endpoint templates that refuse to render with missing parameters
//! - Response models, including a polymorphic [`Item`] tree
//! - [`JenkinsRestClient`] with Basic auth and a cached CSRF crumb
//! - The [`Jenkins`] facade grouping operations into job, build, node and
//!   queue item handles
//!
//! # Modules
//!
//! - `endpoint` - REST path templates
//! - `models` - JSON response types
//! - `client` - HTTP session and operations
//! - `facade` - resource handles over a shared client
//! - `path` - folder and node name to URL segment translation
//! - `replay` - pipeline script extraction from the replay page
//!
//! # Example Usage
//!
//! ```no_run
//! use mcp_jenkins_rest::{ClientOptions, Jenkins};
//!
//! # async fn run() -> mcp_jenkins_rest::JenkinsResult<()> {
//! let jenkins = Jenkins::connect(
//!     "https://jenkins.example.com",
//!     "username",
//!     "api-token",
//!     ClientOptions::default(),
//! )?;
//! for item in jenkins.job.get_all().await? {
//!     println!("{}", item.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod endpoint;
pub mod models;

mod client;
mod error;
mod facade;
mod path;
mod replay;
mod tls;

pub use client::{
    ClientOptions,
    JenkinsRestClient,
    RequestOptions,
};
pub use error::{
    JenkinsError,
    JenkinsResult,
};
pub use facade::{
    BuildResource,
    Jenkins,
    JobResource,
    NodeResource,
    QueueItemResource,
};
pub use models::{
    Build,
    BuildReplay,
    BuildType,
    Item,
    ItemKind,
    Node,
    Queue,
    QueueItem,
};
pub use path::parse_fullname;
pub use replay::extract_scripts;
