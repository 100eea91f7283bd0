//! Configuration file shape and aggregator wiring.

use std::time::Duration;

use anyhow::Context as _;
use docket_cases::{CaseConnector, TaskConnector};
use docket_client::{ClientConfig, Credentials, PaginatingClient};
use docket_core::Aggregator;
use docket_submissions::SubmissionConnector;
use serde::Deserialize;

fn default_timeout_secs() -> u64 { 30 }

fn default_api_key_header() -> String { "x-api-key".to_string() }

/// Top-level settings. A backend without a section is not registered.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Deadline for each connector call, and for each HTTP request.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  #[serde(default)]
  pub cases:        Option<CaseSettings>,
  #[serde(default)]
  pub submissions:  Option<SubmissionSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseSettings {
  #[serde(default)]
  pub id:              Option<String>,
  pub base_url:        String,
  #[serde(default)]
  pub token:           Option<String>,
  /// Catalog domains whose case types are shown. Empty shows everything.
  #[serde(default)]
  pub allowed_domains: Vec<String>,
  #[serde(default)]
  pub show_documents:  bool,
  #[serde(default)]
  pub tasks:           Option<TaskSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskSettings {
  pub base_url:  String,
  #[serde(default)]
  pub token:     Option<String>,
  /// Use the caller's delegated token instead of `token` when present.
  #[serde(default)]
  pub delegated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionSettings {
  #[serde(default)]
  pub id:             Option<String>,
  pub base_url:       String,
  pub api_key:        String,
  #[serde(default = "default_api_key_header")]
  pub api_key_header: String,
}

impl Settings {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// Build an aggregator with one connector per configured backend.
  pub fn aggregator(&self) -> anyhow::Result<Aggregator> {
    let mut builder = Aggregator::builder().with_timeout(self.timeout());

    if let Some(cases) = &self.cases {
      builder = builder
        .register(self.case_connector(cases)?)
        .context("registering case connector")?;
    }
    if let Some(submissions) = &self.submissions {
      builder = builder
        .register(self.submission_connector(submissions)?)
        .context("registering submission connector")?;
    }

    Ok(builder.build())
  }

  fn client(
    &self,
    base_url: &str,
    credentials: Credentials,
  ) -> anyhow::Result<PaginatingClient> {
    PaginatingClient::new(
      ClientConfig::new(base_url)
        .with_credentials(credentials)
        .with_timeout(self.timeout()),
    )
    .with_context(|| format!("creating client for {base_url}"))
  }

  fn case_connector(&self, cases: &CaseSettings) -> anyhow::Result<CaseConnector> {
    let client = self.client(&cases.base_url, bearer(&cases.token))?;
    let mut connector =
      CaseConnector::new(client).with_documents(cases.show_documents);
    if !cases.allowed_domains.is_empty() {
      connector =
        connector.with_allowed_domains(cases.allowed_domains.iter().cloned());
    }
    if let Some(id) = &cases.id {
      connector = connector.with_id(id);
    }
    if let Some(tasks) = &cases.tasks {
      let client = self.client(&tasks.base_url, bearer(&tasks.token))?;
      connector = connector
        .with_tasks(TaskConnector::new(client).with_delegated_token(tasks.delegated));
    }
    Ok(connector)
  }

  fn submission_connector(
    &self,
    submissions: &SubmissionSettings,
  ) -> anyhow::Result<SubmissionConnector> {
    let client = self.client(&submissions.base_url, Credentials::ApiKey {
      header: submissions.api_key_header.clone(),
      value:  submissions.api_key.clone(),
    })?;
    let connector = SubmissionConnector::new(client);
    Ok(match &submissions.id {
      Some(id) => connector.with_id(id),
      None => connector,
    })
  }
}

fn bearer(token: &Option<String>) -> Credentials {
  token.clone().map(Credentials::Bearer).unwrap_or_default()
}
