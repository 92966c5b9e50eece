use std::sync::atomic::{
    AtomicU64,
    Ordering,
};
use std::sync::Arc;

use dashmap::DashMap;
use mcp_jenkins_rest::{
    Jenkins,
    JenkinsRestClient,
};
use tracing::debug;

use crate::credentials::{
    resolve_credentials,
    Credentials,
    RequestCredentials,
};
use crate::error::CoreResult;
use crate::settings::JenkinsSettings;

pub const DEFAULT_POOL_CAPACITY: usize = 32;

struct PooledClient {
    jenkins: Arc<Jenkins>,
    last_used: u64,
}

/// Hands out Jenkins clients per credential set.
///
/// With `session_singleton` on, each distinct (url, username, password)
/// gets one client that keeps its session and crumb across calls, up to
/// `capacity` clients; past that the least recently used one is dropped.
/// Otherwise every call builds a fresh client.
pub struct ClientPool {
    settings: JenkinsSettings,
    capacity: usize,
    clients: DashMap<Credentials, PooledClient>,
    clock: AtomicU64,
}

impl ClientPool {
    pub fn new(settings: JenkinsSettings) -> Self {
        Self::with_capacity(settings, DEFAULT_POOL_CAPACITY)
    }

    /// A pool holding at most `capacity` clients (at least one)
    pub fn with_capacity(settings: JenkinsSettings, capacity: usize) -> Self {
        Self {
            settings,
            capacity: capacity.max(1),
            clients: DashMap::new(),
            clock: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn settings(&self) -> &JenkinsSettings {
        &self.settings
    }

    pub fn client(&self, request: &RequestCredentials) -> CoreResult<Arc<Jenkins>> {
        let credentials = resolve_credentials(request, &self.settings)?;

        if !self.settings.session_singleton {
            return self.build(&credentials);
        }

        if let Some(mut pooled) = self.clients.get_mut(&credentials) {
            pooled.last_used = self.tick();
            return Ok(Arc::clone(&pooled.jenkins));
        }

        let jenkins = self.build(&credentials)?;
        if self.clients.len() >= self.capacity {
            self.evict_least_recent();
        }

        let pooled = PooledClient {
            jenkins,
            last_used: self.tick(),
        };
        let jenkins = Arc::clone(&self.clients.entry(credentials).or_insert(pooled).jenkins);
        Ok(jenkins)
    }

    /// Number of cached clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn evict_least_recent(&self) {
        let oldest = self
            .clients
            .iter()
            .min_by_key(|entry| entry.value().last_used)
            .map(|entry| entry.key().clone());

        if let Some(credentials) = oldest {
            debug!(
                url = %credentials.url,
                username = %credentials.username,
                "Evicting pooled Jenkins client"
            );
            self.clients.remove(&credentials);
        }
    }

    fn build(&self, credentials: &Credentials) -> CoreResult<Arc<Jenkins>> {
        debug!(url = %credentials.url, username = %credentials.username, "Building Jenkins client");
        let client = JenkinsRestClient::new(
            &credentials.url,
            credentials.username.as_str(),
            credentials.password.as_str(),
            self.settings.client_options(),
        )?;
        Ok(Arc::new(Jenkins::new(client)))
    }
}
