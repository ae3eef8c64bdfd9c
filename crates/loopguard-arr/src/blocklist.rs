//! Getting a refused release blocklisted downstream.
//!
//! For the instance serving the download's category we try, in order:
//!
//! 1. the grab history since the start of the retention window,
//! 2. a bounded newest-first scan of paged history,
//! 3. the download queue (remove from client and blocklist).
//!
//! The first strategy that finds the release and gets a 2xx wins.

use loopguard_core::blocklist::{BlockRequest, Blocklister};
use strum::Display;

use crate::{
  ArrClient, Result,
  model::{ArrInstance, ArrKind, HistoryItem, QueueItem},
};

const HISTORY_PAGE_SIZE: u32 = 250;
const HISTORY_MAX_PAGES: u32 = 4;

/// The strategy that succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum BlockMethod {
  RecentHistory,
  HistoryScan,
  Queue,
}

/// Find an item whose title (or download id) equals `name`, falling back to
/// substring containment in either direction.
pub fn find_by_title<'a, T, F>(items: &'a [T], name: &str, fields: F) -> Option<&'a T>
where
  F: Fn(&T) -> (&str, Option<&str>),
{
  if name.is_empty() {
    return None;
  }
  items
    .iter()
    .find(|item| {
      let (title, download_id) = fields(item);
      title == name || download_id == Some(name)
    })
    .or_else(|| {
      items.iter().find(|item| {
        let (title, _) = fields(item);
        !title.is_empty() && (title.contains(name) || name.contains(title))
      })
    })
}

fn history_fields(item: &HistoryItem) -> (&str, Option<&str>) {
  (&item.source_title, item.download_id.as_deref())
}

fn queue_fields(item: &QueueItem) -> (&str, Option<&str>) {
  (&item.title, item.download_id.as_deref())
}

// ─── Blocklister ─────────────────────────────────────────────────────────────

/// Blocklists through the configured Radarr, then Sonarr, instances.
#[derive(Debug, Clone, Default)]
pub struct ArrBlocklister {
  radarr:     Vec<ArrInstance>,
  sonarr:     Vec<ArrInstance>,
  verify_ssl: bool,
}

impl ArrBlocklister {
  pub fn new(radarr: Vec<ArrInstance>, sonarr: Vec<ArrInstance>, verify_ssl: bool) -> Self {
    Self { radarr, sonarr, verify_ssl }
  }

  /// Candidate instances for `category`: the first Radarr match, then the
  /// first Sonarr match.
  pub fn instances_for<'a>(&'a self, category: &str) -> Vec<(ArrKind, &'a ArrInstance)> {
    [(ArrKind::Radarr, &self.radarr), (ArrKind::Sonarr, &self.sonarr)]
      .into_iter()
      .filter_map(|(kind, list)| {
        list.iter().find(|i| i.category == category).map(|i| (kind, i))
      })
      .collect()
  }

  async fn block_in(&self, client: &ArrClient, request: &BlockRequest) -> Option<BlockMethod> {
    let name = request.name.as_str();

    match self.via_recent_history(client, request).await {
      Ok(true) => return Some(BlockMethod::RecentHistory),
      Ok(false) => tracing::debug!(kind = %client.kind(), name, "not in recent history"),
      Err(e) => tracing::warn!(kind = %client.kind(), error = %e, "recent history lookup failed"),
    }

    match self.via_history_scan(client, name).await {
      Ok(true) => return Some(BlockMethod::HistoryScan),
      Ok(false) => tracing::debug!(kind = %client.kind(), name, "not in paged history"),
      Err(e) => tracing::warn!(kind = %client.kind(), error = %e, "history scan failed"),
    }

    match self.via_queue(client, name).await {
      Ok(true) => return Some(BlockMethod::Queue),
      Ok(false) => tracing::info!(kind = %client.kind(), name, "could not find queue item"),
      Err(e) => tracing::warn!(kind = %client.kind(), error = %e, "queue removal failed"),
    }

    None
  }

  async fn via_recent_history(&self, client: &ArrClient, request: &BlockRequest) -> Result<bool> {
    let since = request.now - request.window_seconds;
    let grabs: Vec<HistoryItem> = client
      .history_since(since)
      .await?
      .into_iter()
      .filter(HistoryItem::is_grab)
      .collect();

    match find_by_title(&grabs, &request.name, history_fields) {
      Some(item) => {
        client.mark_history_failed(item.id).await?;
        tracing::info!(kind = %client.kind(), history_id = item.id, "marked recent grab as failed");
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn via_history_scan(&self, client: &ArrClient, name: &str) -> Result<bool> {
    for page in 1..=HISTORY_MAX_PAGES {
      let records = client.history_page(page, HISTORY_PAGE_SIZE).await?;
      let last = records.len() < HISTORY_PAGE_SIZE as usize;
      let grabs: Vec<HistoryItem> = records.into_iter().filter(HistoryItem::is_grab).collect();

      if let Some(item) = find_by_title(&grabs, name, history_fields) {
        client.mark_history_failed(item.id).await?;
        tracing::info!(kind = %client.kind(), history_id = item.id, page, "marked grab as failed");
        return Ok(true);
      }
      if last {
        break;
      }
    }
    Ok(false)
  }

  async fn via_queue(&self, client: &ArrClient, name: &str) -> Result<bool> {
    let queue = client.queue_all().await?;
    if queue.is_empty() {
      tracing::info!(kind = %client.kind(), "queue is empty");
      return Ok(false);
    }

    match find_by_title(&queue, name, queue_fields) {
      Some(item) => {
        client.remove_from_queue(item.id).await?;
        tracing::info!(kind = %client.kind(), queue_id = item.id, "removed from queue and blocklisted");
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

impl Blocklister for ArrBlocklister {
  async fn block(&self, request: &BlockRequest) -> Option<String> {
    for (kind, instance) in self.instances_for(&request.category) {
      tracing::info!(%kind, url = %instance.url, "attempting to blocklist");

      let client = match ArrClient::new(kind, instance, self.verify_ssl) {
        Ok(c) => c,
        Err(e) => {
          tracing::error!(%kind, error = %e, "could not build client");
          continue;
        }
      };

      if let Some(method) = self.block_in(&client, request).await {
        tracing::info!(%kind, %method, "blocklisted");
        return Some(format!("{kind} - {} ({})", request.category, instance.url));
      }
    }
    None
  }
}
