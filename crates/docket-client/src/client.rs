//! [`PaginatingClient`] and its configuration.

use std::{fmt, time::Duration};

use docket_core::{Error, Result};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

/// Upper bound on `next` links followed for a single query.
pub const DEFAULT_MAX_PAGES: usize = 100;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Configuration ───────────────────────────────────────────────────────────

/// How requests authenticate against the backend.
#[derive(Clone, Default)]
pub enum Credentials {
  #[default]
  None,
  /// `Authorization: Bearer <token>`.
  Bearer(String),
  /// A static key sent in a custom header.
  ApiKey { header: String, value: String },
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::None => f.write_str("None"),
      Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
      Self::ApiKey { header, .. } => {
        write!(f, "ApiKey {{ header: {header:?}, value: <redacted> }}")
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub base_url:    String,
  pub credentials: Credentials,
  /// Per-request transport timeout.
  pub timeout:     Duration,
  pub max_pages:   usize,
}

impl ClientConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url:    base_url.into(),
      credentials: Credentials::None,
      timeout:     DEFAULT_TIMEOUT,
      max_pages:   DEFAULT_MAX_PAGES,
    }
  }

  pub fn with_credentials(mut self, credentials: Credentials) -> Self {
    self.credentials = credentials;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_max_pages(mut self, max_pages: usize) -> Self {
    self.max_pages = max_pages;
    self
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// One page of a list response, or the merged result of all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
  pub results: Vec<T>,
  #[serde(default)]
  pub next:    Option<String>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async JSON client bound to one backend base URL.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct PaginatingClient {
  http:        reqwest::Client,
  base:        Url,
  credentials: Credentials,
  timeout:     Duration,
  max_pages:   usize,
}

impl PaginatingClient {
  pub fn new(config: ClientConfig) -> Result<Self> {
    let mut base = Url::parse(&config.base_url).map_err(|e| {
      Error::backend_with(format!("invalid base url {:?}", config.base_url), e)
    })?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let http = reqwest::Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| Error::backend_with("failed to build HTTP client", e))?;

    Ok(Self {
      http,
      base,
      credentials: config.credentials,
      timeout: config.timeout,
      max_pages: config.max_pages,
    })
  }

  /// A copy of this client that authenticates with `token` instead of the
  /// configured credentials.
  pub fn with_bearer(&self, token: impl Into<String>) -> Self {
    Self { credentials: Credentials::Bearer(token.into()), ..self.clone() }
  }

  pub fn base_url(&self) -> &Url { &self.base }

  /// The absolute URL of `path` under the base URL.
  pub fn url_for(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path.trim_start_matches('/'))
      .map_err(|e| Error::backend_with(format!("invalid path {path:?}"), e))
  }

  /// Fetch every page of a list endpoint, following `next` links, and return
  /// the concatenated results in backend order.
  ///
  /// `query` is applied to the first request only; `next` links carry their
  /// own query string.
  pub async fn get_all<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<Envelope<T>> {
    let mut url = self.resolve(path)?;
    let mut query = query;
    let mut results = Vec::new();

    for _ in 0..self.max_pages {
      let response = self.send(&url, query).await?;
      if !response.status().is_success() {
        return Err(unexpected_status(&url, response.status()));
      }
      let page: Envelope<T> = self.decode(&url, response).await?;
      results.extend(page.results);

      match page.next {
        None => return Ok(Envelope { results, next: None }),
        Some(next) => {
          url = self.resolve(&next)?;
          query = &[];
        }
      }
    }

    Err(Error::backend(format!(
      "{path}: still paginating after {} pages",
      self.max_pages
    )))
  }

  /// Fetch a single object by path or by absolute URL under the base URL.
  /// A 404 is `None`.
  pub async fn get_one<T: DeserializeOwned>(
    &self,
    target: &str,
    query: &[(&str, String)],
  ) -> Result<Option<T>> {
    let url = self.resolve(target)?;
    let response = self.send(&url, query).await?;
    match response.status() {
      StatusCode::NOT_FOUND => Ok(None),
      status if status.is_success() => self.decode(&url, response).await.map(Some),
      status => Err(unexpected_status(&url, status)),
    }
  }

  /// Accept relative paths, and absolute URLs only when they point below the
  /// base URL so credentials never leave the configured backend.
  fn resolve(&self, target: &str) -> Result<Url> {
    if !(target.starts_with("http://") || target.starts_with("https://")) {
      return self.url_for(target);
    }
    let url = Url::parse(target)
      .map_err(|e| Error::backend_with(format!("invalid url {target:?}"), e))?;
    if url.as_str().starts_with(self.base.as_str()) {
      Ok(url)
    } else {
      Err(Error::backend(format!(
        "refusing to request {url}: outside {}",
        self.base
      )))
    }
  }

  async fn send(&self, url: &Url, query: &[(&str, String)]) -> Result<Response> {
    debug!(%url, "GET");
    self
      .authorize(self.http.get(url.clone()).query(query))
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          Error::Timeout(self.timeout)
        } else {
          Error::backend_with(format!("GET {url} failed"), e)
        }
      })
  }

  /// Read and parse a response body. The request timeout also covers the
  /// body, so a backend stalling mid-body is a timeout too.
  async fn decode<T: DeserializeOwned>(
    &self,
    url: &Url,
    response: Response,
  ) -> Result<T> {
    let body = response.bytes().await.map_err(|e| {
      if e.is_timeout() {
        Error::Timeout(self.timeout)
      } else {
        Error::backend_with(format!("reading body of {url}"), e)
      }
    })?;
    serde_json::from_slice(&body).map_err(|e| {
      Error::backend_with(format!("unexpected response shape from {url}"), e)
    })
  }

  fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
    match &self.credentials {
      Credentials::None => req,
      Credentials::Bearer(token) => req.bearer_auth(token),
      Credentials::ApiKey { header, value } => req.header(header.as_str(), value),
    }
  }
}

fn unexpected_status(url: &Url, status: StatusCode) -> Error {
  Error::backend(format!("GET {url} → {status}"))
}
