//! List views: the rows a table shows, refreshed from the backend.
//!
//! Rows are replaced only when a refresh succeeds. A failed refresh keeps the
//! previous rows and records a notice. Once a view is unmounted, any response
//! still in flight is discarded.

use dpm_core::EntityKind;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::Client;
use crate::error::ClientError;
use crate::resources::Resource;

#[derive(Debug)]
pub enum RefreshOutcome {
    /// Rows replaced; carries the new row count.
    Updated(usize),
    /// The view was unmounted first.
    Discarded,
    Failed(ClientError),
}

pub struct ListView<R: Resource> {
    rows: Vec<R::Entity>,
    filter: String,
    notice: Option<String>,
    mounted: CancellationToken,
}

impl<R: Resource> Default for ListView<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> ListView<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            filter: String::new(),
            notice: None,
            mounted: CancellationToken::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        R::KIND
    }

    pub fn rows(&self) -> &[R::Entity] {
        &self.rows
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        !self.mounted.is_cancelled()
    }

    /// Token that unmounts the view when cancelled, for teardown from
    /// another task.
    pub fn unmount_token(&self) -> CancellationToken {
        self.mounted.clone()
    }

    pub fn unmount(&self) {
        self.mounted.cancel();
    }

    /// Re-fetch with the current filter.
    pub async fn refresh(&mut self, client: &Client) -> RefreshOutcome {
        let unmounted = self.mounted.clone();
        let filter = self.filter.clone();
        let entities = client.entities::<R>();
        tokio::select! {
            biased;
            _ = unmounted.cancelled() => {
                debug!(kind = %R::KIND, "view unmounted, response discarded");
                RefreshOutcome::Discarded
            }
            result = entities.list(Some(&filter)) => match result {
                Ok(rows) => {
                    let count = rows.len();
                    self.rows = rows;
                    self.notice = None;
                    RefreshOutcome::Updated(count)
                }
                Err(err) => {
                    self.notice = Some(err.to_string());
                    RefreshOutcome::Failed(err)
                }
            },
        }
    }

    /// Replace the filter and re-fetch. The result depends only on the new
    /// filter, never on the previous one.
    pub async fn search(&mut self, client: &Client, filter: &str) -> RefreshOutcome {
        self.filter = filter.trim().to_string();
        self.refresh(client).await
    }
}
