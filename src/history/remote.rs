//! Per-user history on a remote service.
//!
//! [`HistoryCollection`] is the raw per-user record collection;
//! [`RemoteHistoryStore`] layers the shared history contract on top of it
//! for one signed-in [`Identity`], pruning beyond capacity after each append.
//!
//! ```text
//!   RemoteHistoryStore(owner) ──► HistoryCollection
//!                                   │
//!                                   └─ HttpHistoryCollection
//!                                        {base}/users/{uid}/history[/{id}]
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{DeploymentMode, HistoryConfig};
use crate::history::{HistoryEntry, HistoryError, HistoryStore, NewHistoryEntry};
use crate::identity::Identity;

// ---------------------------------------------------------------------------
// HistoryCollection trait
// ---------------------------------------------------------------------------

/// Records keyed by owner.  Every call is scoped to `owner.user_id`.
#[async_trait]
pub trait HistoryCollection: Send + Sync {
    async fn insert(&self, owner: &Identity, entry: &HistoryEntry) -> Result<(), HistoryError>;

    /// Newest first; `limit` caps the count when given.
    async fn recent(
        &self,
        owner: &Identity,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// `NotFound` when the owner has no record `id`.
    async fn update_favorite(
        &self,
        owner: &Identity,
        id: &str,
        value: bool,
    ) -> Result<(), HistoryError>;

    async fn remove(&self, owner: &Identity, ids: &[String]) -> Result<(), HistoryError>;

    async fn remove_all(&self, owner: &Identity) -> Result<(), HistoryError>;
}

// ---------------------------------------------------------------------------
// HttpHistoryCollection
// ---------------------------------------------------------------------------

/// REST client for the history service.
///
/// | Operation       | Request                                  |
/// |-----------------|------------------------------------------|
/// | insert          | `POST   /users/{uid}/history`            |
/// | recent          | `GET    /users/{uid}/history?limit=N`    |
/// | update_favorite | `PATCH  /users/{uid}/history/{id}`       |
/// | remove          | `DELETE /users/{uid}/history/{id}`       |
/// | remove_all      | `DELETE /users/{uid}/history`            |
pub struct HttpHistoryCollection {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHistoryCollection {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.remote_base_url.clone(), config.timeout_secs)
    }

    fn url(&self, owner: &Identity, id: Option<&str>) -> Result<reqwest::Url, HistoryError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| HistoryError::PersistenceFailure(format!("bad history url: {e}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                HistoryError::PersistenceFailure(format!("bad history url: {}", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .push("users")
                .push(&owner.user_id)
                .push("history");
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder, owner: &Identity) -> reqwest::RequestBuilder {
        match owner.token.as_deref() {
            Some(token) if !token.is_empty() => req.bearer_auth(token),
            _ => req,
        }
    }
}

#[async_trait]
impl HistoryCollection for HttpHistoryCollection {
    async fn insert(&self, owner: &Identity, entry: &HistoryEntry) -> Result<(), HistoryError> {
        let req = self.client.post(self.url(owner, None)?).json(entry);
        self.authorize(req, owner).send().await?.error_for_status()?;
        Ok(())
    }

    async fn recent(
        &self,
        owner: &Identity,
        limit: Option<usize>,
    ) -> Result<Vec<HistoryEntry>, HistoryError> {
        let mut req = self.client.get(self.url(owner, None)?);
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        let response = self.authorize(req, owner).send().await?.error_for_status()?;

        let mut entries: Vec<HistoryEntry> = response.json().await?;
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    async fn update_favorite(
        &self,
        owner: &Identity,
        id: &str,
        value: bool,
    ) -> Result<(), HistoryError> {
        let req = self
            .client
            .patch(self.url(owner, Some(id))?)
            .json(&serde_json::json!({ "isFavorite": value }));
        let response = self.authorize(req, owner).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        response.error_for_status()?;
        Ok(())
    }

    async fn remove(&self, owner: &Identity, ids: &[String]) -> Result<(), HistoryError> {
        for id in ids {
            let req = self.client.delete(self.url(owner, Some(id))?);
            let response = self.authorize(req, owner).send().await?;
            if response.status() != reqwest::StatusCode::NOT_FOUND {
                response.error_for_status()?;
            }
        }
        Ok(())
    }

    async fn remove_all(&self, owner: &Identity) -> Result<(), HistoryError> {
        let req = self.client.delete(self.url(owner, None)?);
        self.authorize(req, owner).send().await?.error_for_status()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RemoteHistoryStore
// ---------------------------------------------------------------------------

/// History contract over a [`HistoryCollection`] for one owner.
pub struct RemoteHistoryStore {
    collection: Arc<dyn HistoryCollection>,
    owner: Identity,
    capacity: usize,
}

impl RemoteHistoryStore {
    pub fn new(collection: Arc<dyn HistoryCollection>, owner: Identity, capacity: usize) -> Self {
        Self {
            collection,
            owner,
            capacity,
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Delete everything past `capacity`.  Failures only cost disk space.
    async fn prune(&self) {
        let entries = match self.collection.recent(&self.owner, None).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("history: prune listing failed ({e})");
                return;
            }
        };
        if entries.len() <= self.capacity {
            return;
        }

        let excess: Vec<String> = entries[self.capacity..].iter().map(|e| e.id.clone()).collect();
        log::debug!("history: pruning {} remote entries", excess.len());
        if let Err(e) = self.collection.remove(&self.owner, &excess).await {
            log::warn!("history: prune failed ({e})");
        }
    }
}

#[async_trait]
impl HistoryStore for RemoteHistoryStore {
    async fn append(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, HistoryError> {
        let entry = entry.into_entry();
        self.collection.insert(&self.owner, &entry).await?;
        self.prune().await;
        Ok(entry)
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        self.collection
            .recent(&self.owner, Some(self.capacity))
            .await
    }

    async fn set_favorite(&self, id: &str, value: bool) -> Result<(), HistoryError> {
        self.collection
            .update_favorite(&self.owner, id, value)
            .await
    }

    async fn clear_all(&self) -> Result<(), HistoryError> {
        self.collection.remove_all(&self.owner).await
    }

    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Cloud
    }
}

// ---------------------------------------------------------------------------
// In-memory collection (tests)
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
