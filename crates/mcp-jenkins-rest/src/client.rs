//! Jenkins REST client and operations

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::fmt;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{
    HeaderMap,
    HeaderName,
    HeaderValue,
    CONTENT_TYPE,
    LOCATION,
};
use reqwest::{
    Client,
    Method,
    Response,
};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{
    debug,
    info,
};

use crate::endpoint;
use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::models::{
    Build,
    BuildReplay,
    BuildType,
    Crumb,
    Item,
    ItemsResponse,
    Node,
    NodesResponse,
    Queue,
    QueueItem,
};
use crate::path::{
    node_segment,
    parse_fullname,
};
use crate::{
    replay,
    tls,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(75);

/// Fields requested for every level of the item tree
const ITEM_TREE_FIELDS: &str = "_class,name,url,fullName,color";

/// How many folder levels `get_item_tree` asks Jenkins to expand
const ITEM_TREE_LEVELS: usize = 10;

/// Executors only report their current build from this depth on
const RUNNING_BUILDS_DEPTH: u32 = 2;

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub verify_ssl: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: true,
        }
    }
}

/// Per-request additions on top of the client's session
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    headers: HeaderMap,
    params: Vec<(String, String)>,
    body: Option<String>,
    skip_crumb: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sends the request without the CSRF crumb header
    pub fn without_crumb(mut self) -> Self {
        self.skip_crumb = true;
        self
    }
}

/// An authenticated session against one Jenkins controller.
///
/// The CSRF crumb is fetched on first use and cached for the lifetime of
/// the client. A 404 from the crumb issuer means CSRF protection is off and
/// is cached as an empty header; any other failure is returned and the next
/// request tries again.
pub struct JenkinsRestClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    options: ClientOptions,
    crumb: OnceCell<HashMap<String, String>>,
}

impl fmt::Debug for JenkinsRestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JenkinsRestClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("options", &self.options)
            .finish()
    }
}

impl JenkinsRestClient {
    pub fn new(
        url: &str, username: impl Into<String>, password: impl Into<String>,
        options: ClientOptions,
    ) -> JenkinsResult<Self> {
        let base_url = normalize_base_url(url)?;

        tls::install_crypto_provider();

        let http = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(!options.verify_ssl)
            .build()
            .map_err(|e| JenkinsError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        let username = username.into();
        info!(
            url = %base_url,
            username = %username,
            timeout_secs = options.timeout.as_secs(),
            verify_ssl = options.verify_ssl,
            "Created Jenkins client"
        );

        Ok(Self {
            http,
            base_url,
            username,
            password: password.into(),
            options,
            crumb: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn options(&self) -> ClientOptions {
        self.options
    }

    /// Full URL for an endpoint, e.g. `https://example.com/crumbIssuer/api/json`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_matches('/'),
            endpoint.trim_matches('/')
        )
    }

    /// Issues a request. Any non-2xx status is returned as
    /// [`JenkinsError::Http`]; nothing is retried.
    pub async fn request(
        &self, method: Method, endpoint: &str, options: RequestOptions,
    ) -> JenkinsResult<Response> {
        if options.skip_crumb {
            self.send(method, endpoint, options, None).await
        } else {
            let crumb = self.crumb_header().await?;
            self.send(method, endpoint, options, Some(crumb)).await
        }
    }

    /// The cached `{crumbRequestField: crumb}` header, fetched on first call.
    /// Concurrent first calls share a single fetch.
    pub async fn crumb_header(&self) -> JenkinsResult<&HashMap<String, String>> {
        self.crumb.get_or_try_init(|| self.fetch_crumb()).await
    }

    async fn fetch_crumb(&self) -> JenkinsResult<HashMap<String, String>> {
        let endpoint = endpoint::CRUMB.call(&[])?;

        match self
            .send(Method::GET, &endpoint, RequestOptions::new(), None)
            .await
        {
            Ok(response) => {
                let crumb: Crumb = read_json(response).await?;
                debug!(field = %crumb.crumb_request_field, "Fetched CSRF crumb");
                Ok(HashMap::from([(crumb.crumb_request_field, crumb.crumb)]))
            }
            Err(e) if e.is_not_found() => {
                debug!("Crumb issuer is disabled, sending requests without a crumb");
                Ok(HashMap::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn send(
        &self, method: Method, endpoint: &str, options: RequestOptions,
        crumb: Option<&HashMap<String, String>>,
    ) -> JenkinsResult<Response> {
        let url = self.endpoint_url(endpoint);

        let mut headers = options.headers;
        for (field, token) in crumb.into_iter().flatten() {
            let name = HeaderName::from_bytes(field.as_bytes()).map_err(|e| {
                JenkinsError::InvalidResponse(format!("Invalid crumb field {field:?}: {e}"))
            })?;
            let value = HeaderValue::from_str(token)
                .map_err(|e| JenkinsError::InvalidResponse(format!("Invalid crumb value: {e}")))?;
            headers.insert(name, value);
        }

        debug!(%method, %url, "Sending Jenkins request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .basic_auth(&self.username, Some(&self.password))
            .headers(headers);
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| JenkinsError::Network(format!("{method} {url} failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%method, %url, status = status.as_u16(), "Jenkins request failed");

        Err(JenkinsError::Http {
            status: status.as_u16(),
            url,
            message: error_preview(&body, status.canonical_reason()),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> JenkinsResult<T> {
        let response = self
            .request(Method::GET, endpoint, RequestOptions::new())
            .await?;
        read_json(response).await
    }

    async fn get_text(&self, endpoint: &str) -> JenkinsResult<String> {
        let response = self
            .request(Method::GET, endpoint, RequestOptions::new())
            .await?;
        Ok(response.text().await?)
    }

    async fn post(&self, endpoint: &str) -> JenkinsResult<()> {
        self.request(Method::POST, endpoint, RequestOptions::new())
            .await?;
        Ok(())
    }

    // Queue

    pub async fn get_queue(&self, depth: u32) -> JenkinsResult<Queue> {
        let endpoint = endpoint::QUEUE.call(&[("depth", &depth)])?;
        self.get_json(&endpoint).await
    }

    pub async fn get_queue_item(&self, id: u64, depth: u32) -> JenkinsResult<QueueItem> {
        let endpoint = endpoint::QUEUE_ITEM.call(&[("id", &id), ("depth", &depth)])?;
        self.get_json(&endpoint).await
    }

    pub async fn cancel_queue_item(&self, id: u64) -> JenkinsResult<()> {
        let endpoint = endpoint::QUEUE_CANCEL_ITEM.call(&[("id", &id)])?;
        self.post(&endpoint).await
    }

    // Nodes

    pub async fn get_node(&self, name: &str, depth: u32) -> JenkinsResult<Node> {
        let endpoint =
            endpoint::NODE.call(&[("name", &node_segment(name)), ("depth", &depth)])?;
        self.get_json(&endpoint).await
    }

    pub async fn get_nodes(&self, depth: u32) -> JenkinsResult<Vec<Node>> {
        let endpoint = endpoint::NODES.call(&[("depth", &depth)])?;
        let response: NodesResponse = self.get_json(&endpoint).await?;
        Ok(response.computer)
    }

    /// The node's `config.xml`, unparsed
    pub async fn get_node_config(&self, name: &str) -> JenkinsResult<String> {
        let endpoint = endpoint::NODE_CONFIG.call(&[("name", &node_segment(name))])?;
        self.get_text(&endpoint).await
    }

    // Builds

    pub async fn get_build(&self, fullname: &str, number: u64, depth: u32) -> JenkinsResult<Build> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::BUILD.call(&[
            ("folder", &folder),
            ("name", &name),
            ("number", &number),
            ("depth", &depth),
        ])?;
        self.get_json(&endpoint).await
    }

    pub async fn get_last_build(&self, fullname: &str, depth: u32) -> JenkinsResult<Build> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::LAST_BUILD.call(&[
            ("folder", &folder),
            ("name", &name),
            ("depth", &depth),
        ])?;
        self.get_json(&endpoint).await
    }

    pub async fn get_build_console_output(
        &self, fullname: &str, number: u64,
    ) -> JenkinsResult<String> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::BUILD_CONSOLE.call(&[
            ("folder", &folder),
            ("name", &name),
            ("number", &number),
        ])?;
        self.get_text(&endpoint).await
    }

    pub async fn stop_build(&self, fullname: &str, number: u64) -> JenkinsResult<()> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::BUILD_STOP.call(&[
            ("folder", &folder),
            ("name", &name),
            ("number", &number),
        ])?;
        self.post(&endpoint).await
    }

    pub async fn get_build_replay(&self, fullname: &str, number: u64) -> JenkinsResult<BuildReplay> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::BUILD_REPLAY.call(&[
            ("folder", &folder),
            ("name", &name),
            ("number", &number),
        ])?;
        let html = self.get_text(&endpoint).await?;

        Ok(BuildReplay {
            scripts: replay::extract_scripts(&html),
        })
    }

    /// Test report JSON as Jenkins returns it; its shape depends on the
    /// reporting plugin, so it is not modelled.
    pub async fn get_build_test_report(
        &self, fullname: &str, number: u64, depth: u32,
    ) -> JenkinsResult<serde_json::Value> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::BUILD_TEST_REPORT.call(&[
            ("folder", &folder),
            ("name", &name),
            ("number", &number),
            ("depth", &depth),
        ])?;
        self.get_json(&endpoint).await
    }

    /// Builds currently occupying an executor, in node order then executor
    /// order. Only `url`, `number` and `timestamp` are filled in.
    pub async fn get_running_builds(&self) -> JenkinsResult<Vec<Build>> {
        let nodes = self.get_nodes(RUNNING_BUILDS_DEPTH).await?;

        let mut builds = Vec::new();
        for node in nodes {
            for executable in node
                .executors
                .into_iter()
                .filter_map(|executor| executor.current_executable)
            {
                let Some(number) = executable.number else {
                    continue;
                };
                let url = executable.url.ok_or_else(|| {
                    JenkinsError::InvalidResponse(format!(
                        "Running build #{number} on {} has no url",
                        node.display_name
                    ))
                })?;

                let mut build = Build::new(number, url);
                build.timestamp = executable.timestamp;
                builds.push(build);
            }
        }

        Ok(builds)
    }

    // Items

    /// Top-level items with their folders expanded
    pub async fn get_item_tree(&self) -> JenkinsResult<Vec<Item>> {
        let query = items_tree_query(ITEM_TREE_LEVELS);
        let endpoint = endpoint::ITEMS.call(&[("folder", &""), ("query", &query)])?;
        let response: ItemsResponse = self.get_json(&endpoint).await?;
        Ok(response.jobs)
    }

    /// Every item, flattened depth-first with parents before children
    pub async fn get_items(&self) -> JenkinsResult<Vec<Item>> {
        let tree = self.get_item_tree().await?;
        Ok(Item::flatten(&tree))
    }

    pub async fn get_item(&self, fullname: &str, depth: u32) -> JenkinsResult<Item> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint =
            endpoint::ITEM.call(&[("folder", &folder), ("name", &name), ("depth", &depth)])?;
        self.get_json(&endpoint).await
    }

    pub async fn get_item_config(&self, fullname: &str) -> JenkinsResult<String> {
        let endpoint = item_config_endpoint(fullname)?;
        self.get_text(&endpoint).await
    }

    /// Replaces the item's `config.xml`
    pub async fn update_item_config(&self, fullname: &str, config: &str) -> JenkinsResult<()> {
        let endpoint = item_config_endpoint(fullname)?;
        let options = RequestOptions::new()
            .header(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE))
            .body(config);

        self.request(Method::POST, &endpoint, options).await?;
        Ok(())
    }

    /// Items whose class, full name and color all match the given patterns.
    ///
    /// A pattern must match from the start of the field. `None` matches
    /// everything, and a field the item does not have is matched as an
    /// empty string.
    pub async fn query_items(
        &self, class_pattern: Option<&str>, fullname_pattern: Option<&str>,
        color_pattern: Option<&str>,
    ) -> JenkinsResult<Vec<Item>> {
        let filter = ItemFilter::new(class_pattern, fullname_pattern, color_pattern)?;
        let items = self.get_items().await?;
        Ok(items.into_iter().filter(|item| filter.matches(item)).collect())
    }

    /// Triggers a build and returns the id of the queue item Jenkins created
    pub async fn build_item(
        &self, fullname: &str, build_type: BuildType, params: Option<&BTreeMap<String, String>>,
    ) -> JenkinsResult<u64> {
        let (folder, name) = parse_fullname(fullname);
        let endpoint = endpoint::ITEM_BUILD.call(&[
            ("folder", &folder),
            ("name", &name),
            ("build_type", &build_type),
        ])?;

        let mut options = RequestOptions::new();
        if let Some(params) = params {
            options = options.params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let response = self.request(Method::POST, &endpoint, options).await?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                JenkinsError::InvalidResponse(format!(
                    "Build of {fullname} returned no Location header"
                ))
            })?;

        let id = queue_id_from_location(location).ok_or_else(|| {
            JenkinsError::InvalidResponse(format!(
                "Cannot read a queue id from Location {location:?}"
            ))
        })?;

        debug!(fullname, queue_id = id, "Queued Jenkins build");
        Ok(id)
    }
}

fn item_config_endpoint(fullname: &str) -> JenkinsResult<String> {
    let (folder, name) = parse_fullname(fullname);
    endpoint::ITEM_CONFIG.call(&[("folder", &folder), ("name", &name)])
}

fn normalize_base_url(url: &str) -> JenkinsResult<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(JenkinsError::InvalidConfig(
            "Jenkins url must not be empty".to_string(),
        ));
    }

    reqwest::Url::parse(trimmed)
        .map_err(|e| JenkinsError::InvalidConfig(format!("Invalid Jenkins url {trimmed:?}: {e}")))?;

    Ok(trimmed.trim_end_matches('/').to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> JenkinsResult<T> {
    let url = response.url().to_string();
    let text = response.text().await?;
    serde_json::from_str(&text)
        .map_err(|e| JenkinsError::Serialization(format!("Failed to parse {url}: {e}")))
}

/// `jobs[fields,jobs[fields,...]]`, nested `levels` deep
fn items_tree_query(levels: usize) -> String {
    let mut query = format!("jobs[{ITEM_TREE_FIELDS}]");
    for _ in 1..levels {
        query = format!("jobs[{ITEM_TREE_FIELDS},{query}]");
    }
    query
}

/// Jenkins answers a build trigger with `Location: .../queue/item/{id}/`
fn queue_id_from_location(location: &str) -> Option<u64> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

fn error_preview(body: &str, reason: Option<&str>) -> String {
    let reason = reason.unwrap_or("Unknown error");
    if body.trim().is_empty() || body.contains("<!DOCTYPE html>") || body.contains("<html") {
        return reason.to_string();
    }

    let preview: String = body.chars().take(300).collect();
    if preview.len() < body.len() {
        format!("{reason}: {preview}...")
    } else {
        format!("{reason}: {preview}")
    }
}

struct ItemFilter {
    class: Option<Regex>,
    fullname: Option<Regex>,
    color: Option<Regex>,
}

impl ItemFilter {
    fn new(
        class: Option<&str>, fullname: Option<&str>, color: Option<&str>,
    ) -> JenkinsResult<Self> {
        Ok(Self {
            class: class.map(anchored).transpose()?,
            fullname: fullname.map(anchored).transpose()?,
            color: color.map(anchored).transpose()?,
        })
    }

    fn matches(&self, item: &Item) -> bool {
        field_matches(self.class.as_ref(), Some(item.class()))
            && field_matches(self.fullname.as_ref(), item.fullname())
            && field_matches(self.color.as_ref(), item.color())
    }
}

fn anchored(pattern: &str) -> JenkinsResult<Regex> {
    Ok(Regex::new(&format!("^(?:{pattern})"))?)
}

fn field_matches(pattern: Option<&Regex>, value: Option<&str>) -> bool {
    pattern.is_none_or(|re| re.is_match(value.unwrap_or_default()))
}
