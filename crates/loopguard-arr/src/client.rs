//! Async HTTP client for one Radarr/Sonarr instance.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{
  Error, Result,
  model::{ArrInstance, ArrKind, HistoryItem, Page, QueueItem},
};

/// Per-request timeout for every downstream call. Calls are never retried.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const QUEUE_PAGE_SIZE: u32 = 1000;
const QUEUE_MAX_PAGES: u32 = 50;

/// Client bound to a single instance.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct ArrClient {
  client:   Client,
  kind:     ArrKind,
  base_url: String,
  api_key:  String,
}

impl ArrClient {
  pub fn new(kind: ArrKind, instance: &ArrInstance, verify_ssl: bool) -> Result<Self> {
    let client = Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .danger_accept_invalid_certs(!verify_ssl)
      .build()
      .map_err(Error::Client)?;
    Ok(Self {
      client,
      kind,
      base_url: instance.url.trim_end_matches('/').to_owned(),
      api_key: instance.api_key.clone(),
    })
  }

  pub fn kind(&self) -> ArrKind { self.kind }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, format!("{}/api/v3{}", self.base_url, path))
      .header("X-Api-Key", &self.api_key)
  }

  async fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<reqwest::Response> {
    let resp = req.send().await.map_err(|source| Error::Request {
      endpoint: endpoint.to_owned(),
      source,
    })?;
    if !resp.status().is_success() {
      return Err(Error::Status { endpoint: endpoint.to_owned(), status: resp.status() });
    }
    Ok(resp)
  }

  async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, req: RequestBuilder) -> Result<T> {
    self
      .send(endpoint, req)
      .await?
      .json()
      .await
      .map_err(|source| Error::Request { endpoint: endpoint.to_owned(), source })
  }

  // ── Queue ─────────────────────────────────────────────────────────────────

  /// `GET /api/v3/queue?page=<n>&pageSize=<size>`
  pub async fn queue_page(&self, page: u32, page_size: u32) -> Result<Vec<QueueItem>> {
    let req = self
      .request(Method::GET, "/queue")
      .query(&[("page", page), ("pageSize", page_size)]);
    let page: Page<QueueItem> = self.get_json("GET /queue", req).await?;
    Ok(page.records)
  }

  /// Every queue item, following pages until a short or empty one.
  ///
  /// Only a failure on the first page is an error. A later failing page ends
  /// the walk and the items already fetched are returned.
  pub async fn queue_all(&self) -> Result<Vec<QueueItem>> {
    let mut all = Vec::new();
    for page in 1..=QUEUE_MAX_PAGES {
      let records = match self.queue_page(page, QUEUE_PAGE_SIZE).await {
        Ok(records) => records,
        Err(e) if page > 1 => {
          tracing::warn!(kind = %self.kind, page, error = %e, "queue page failed, keeping earlier pages");
          break;
        }
        Err(e) => return Err(e),
      };
      let short = records.len() < QUEUE_PAGE_SIZE as usize;
      all.extend(records);
      if short {
        break;
      }
    }
    Ok(all)
  }

  /// `DELETE /api/v3/queue/<id>?removeFromClient=true&blocklist=true`
  pub async fn remove_from_queue(&self, id: i64) -> Result<()> {
    let req = self
      .request(Method::DELETE, &format!("/queue/{id}"))
      .query(&[("removeFromClient", "true"), ("blocklist", "true")]);
    self.send("DELETE /queue", req).await?;
    Ok(())
  }

  // ── History ───────────────────────────────────────────────────────────────

  /// `GET /api/v3/history/since?date=<rfc3339>&eventType=grabbed`
  pub async fn history_since(&self, since_unix: i64) -> Result<Vec<HistoryItem>> {
    let since = DateTime::from_timestamp(since_unix, 0)
      .ok_or(Error::Timestamp(since_unix))?
      .to_rfc3339_opts(SecondsFormat::Secs, true);
    let req = self
      .request(Method::GET, "/history/since")
      .query(&[("date", since.as_str()), ("eventType", "grabbed")]);
    self.get_json("GET /history/since", req).await
  }

  /// `GET /api/v3/history?page=<n>&pageSize=<size>` newest first.
  pub async fn history_page(&self, page: u32, page_size: u32) -> Result<Vec<HistoryItem>> {
    let req = self.request(Method::GET, "/history").query(&[
      ("page", page.to_string()),
      ("pageSize", page_size.to_string()),
      ("sortKey", "date".to_owned()),
      ("sortDirection", "descending".to_owned()),
    ]);
    let page: Page<HistoryItem> = self.get_json("GET /history", req).await?;
    Ok(page.records)
  }

  /// `POST /api/v3/history/failed/<id>`: marks the grab failed, which puts
  /// the release on the instance's blocklist.
  pub async fn mark_history_failed(&self, id: i64) -> Result<()> {
    let req = self.request(Method::POST, &format!("/history/failed/{id}"));
    self.send("POST /history/failed", req).await?;
    Ok(())
  }
}
