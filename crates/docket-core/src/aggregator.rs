//! The [`Aggregator`]: a frozen registry of connectors presented as one
//! record source.
//!
//! Listing fans out to every connector concurrently and tolerates individual
//! failures. Detail and download calls are routed to the connector the caller
//! names, without retry.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
  Connector, Error, Identity, Result,
  record::{FileReference, RecordSummary, SingleRecord},
};

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Collects connectors before any request is served. Registration is only
/// possible here; [`AggregatorBuilder::build`] freezes the registry.
#[derive(Default)]
pub struct AggregatorBuilder {
  connectors: Vec<Arc<dyn Connector>>,
  timeout:    Option<Duration>,
}

impl AggregatorBuilder {
  /// Add a connector under its own [`Connector::id`].
  ///
  /// Returns [`Error::DuplicateConnector`] if the id is already taken.
  pub fn register<C>(self, connector: C) -> Result<Self>
  where
    C: Connector + 'static,
  {
    self.register_arc(Arc::new(connector))
  }

  pub fn register_arc(mut self, connector: Arc<dyn Connector>) -> Result<Self> {
    if self.connectors.iter().any(|c| c.id() == connector.id()) {
      return Err(Error::DuplicateConnector(connector.id().to_string()));
    }
    self.connectors.push(connector);
    Ok(self)
  }

  /// Bound every delegated connector call by `limit`. Exceeding it yields
  /// [`Error::Timeout`].
  pub fn with_timeout(mut self, limit: Duration) -> Self {
    self.timeout = Some(limit);
    self
  }

  pub fn build(self) -> Aggregator {
    let by_id = self
      .connectors
      .iter()
      .map(|c| (c.id().to_string(), Arc::clone(c)))
      .collect();
    Aggregator {
      connectors: self.connectors,
      by_id,
      timeout: self.timeout,
    }
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// A connector whose `list` call failed during a fan-out.
#[derive(Debug)]
pub struct ConnectorFailure {
  pub connector_id: String,
  pub error:        Error,
}

/// The outcome of [`Aggregator::list_detailed`]: every record that could be
/// fetched, plus the connectors that could not deliver.
#[derive(Debug, Default)]
pub struct Listing {
  pub records:  Vec<RecordSummary>,
  pub failures: Vec<ConnectorFailure>,
}

impl Listing {
  /// True when at least one connector is missing from `records`.
  pub fn is_degraded(&self) -> bool { !self.failures.is_empty() }

  /// True when some connector failed by exceeding its deadline, as opposed
  /// to a backend fault.
  pub fn any_timed_out(&self) -> bool {
    self.failures.iter().any(|f| f.error.is_timeout())
  }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// Combines connectors into one record view.
///
/// Cheap to share behind an `Arc`; the registry is read-only after
/// construction.
pub struct Aggregator {
  connectors: Vec<Arc<dyn Connector>>,
  by_id:      HashMap<String, Arc<dyn Connector>>,
  timeout:    Option<Duration>,
}

impl Aggregator {
  pub fn builder() -> AggregatorBuilder { AggregatorBuilder::default() }

  /// Registered connector ids, in registration order.
  pub fn connector_ids(&self) -> impl Iterator<Item = &str> {
    self.connectors.iter().map(|c| c.id())
  }

  /// Every record visible to `identity` across all connectors.
  ///
  /// A failing connector is logged and contributes nothing; it never aborts
  /// its siblings.
  pub async fn list(&self, identity: &Identity) -> Vec<RecordSummary> {
    self.list_detailed(identity).await.records
  }

  /// Like [`Aggregator::list`], but also reports which connectors failed.
  pub async fn list_detailed(&self, identity: &Identity) -> Listing {
    let calls = self.connectors.iter().map(|connector| async move {
      (connector.id(), self.bounded(connector.list(identity)).await)
    });

    let mut listing = Listing::default();
    for (connector_id, result) in join_all(calls).await {
      match result {
        Ok(mut records) => {
          debug!(connector = connector_id, count = records.len(), "listed records");
          listing.records.append(&mut records);
        }
        Err(error) => {
          warn!(connector = connector_id, %error, "list failed; omitting connector");
          listing.failures.push(ConnectorFailure {
            connector_id: connector_id.to_string(),
            error,
          });
        }
      }
    }
    listing
  }

  /// One record from the named connector.
  pub async fn get(
    &self,
    connector_id: &str,
    record_id: &str,
    identity: &Identity,
  ) -> Result<Option<SingleRecord>> {
    let connector = self.connector(connector_id)?;
    self.bounded(connector.get(record_id, identity)).await
  }

  /// A file reference from the named connector.
  pub async fn download(
    &self,
    connector_id: &str,
    record_id: &str,
    file_id: &str,
    identity: &Identity,
  ) -> Result<Option<FileReference>> {
    let connector = self.connector(connector_id)?;
    self
      .bounded(connector.download(record_id, file_id, identity))
      .await
  }

  fn connector(&self, connector_id: &str) -> Result<&Arc<dyn Connector>> {
    self
      .by_id
      .get(connector_id)
      .ok_or_else(|| Error::UnknownConnector(connector_id.to_string()))
  }

  async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
    match self.timeout {
      Some(limit) => tokio::time::timeout(limit, call)
        .await
        .map_err(|_| Error::Timeout(limit))?,
      None => call.await,
    }
  }
}

#[cfg(test)]
mod tests {
  use async_trait::async_trait;
  use chrono::NaiveDate;

  use super::*;
  use crate::record::{RecordKind, composite_id};

  fn summary(connector: &str, native: &str) -> RecordSummary {
    RecordSummary {
      identifier:        native.to_uppercase(),
      internal_id:       composite_id(connector, native),
      title:             None,
      registration_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
      planned_end_date:  None,
      forced_end_date:   None,
      end_date:          None,
      case_type:         "Bezwaar".into(),
      status:            Some("Ontvangen".into()),
      outcome:           None,
    }
  }

  enum Behaviour {
    Records(Vec<RecordSummary>),
    Fail,
    Hang,
  }

  struct FakeConnector {
    id:        &'static str,
    behaviour: Behaviour,
  }

  impl FakeConnector {
    fn new(id: &'static str, behaviour: Behaviour) -> Self {
      Self { id, behaviour }
    }
  }

  #[async_trait]
  impl Connector for FakeConnector {
    fn id(&self) -> &str { self.id }

    async fn list(&self, _identity: &Identity) -> Result<Vec<RecordSummary>> {
      match &self.behaviour {
        Behaviour::Records(r) => Ok(r.clone()),
        Behaviour::Fail => Err(Error::backend("backend unreachable")),
        Behaviour::Hang => {
          tokio::time::sleep(Duration::from_secs(30)).await;
          Ok(Vec::new())
        }
      }
    }

    async fn get(
      &self,
      record_id: &str,
      _identity: &Identity,
    ) -> Result<Option<SingleRecord>> {
      match &self.behaviour {
        Behaviour::Records(r) => Ok(
          r.iter()
            .find(|s| s.internal_id == composite_id(self.id, record_id))
            .map(|s| SingleRecord {
              summary:   s.clone(),
              statuses:  None,
              documents: Vec::new(),
              tasks:     Vec::new(),
              assignees: Vec::new(),
              kind:      RecordKind::Case,
            }),
        ),
        Behaviour::Fail => Err(Error::backend("backend unreachable")),
        Behaviour::Hang => {
          tokio::time::sleep(Duration::from_secs(30)).await;
          Ok(None)
        }
      }
    }

    async fn download(
      &self,
      record_id: &str,
      file_id: &str,
      _identity: &Identity,
    ) -> Result<Option<FileReference>> {
      Ok(Some(FileReference {
        url:        format!("https://files.example/{record_id}/{file_id}"),
        file_name:  None,
        expires_at: None,
      }))
    }
  }

  fn alice() -> Identity { Identity::person("999990019", "Alice") }

  #[tokio::test]
  async fn list_keeps_results_of_healthy_connectors() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new("broken", Behaviour::Fail))
      .unwrap()
      .register(FakeConnector::new(
        "zaken",
        Behaviour::Records(vec![summary("zaken", "a"), summary("zaken", "b")]),
      ))
      .unwrap()
      .build();

    let records = aggregator.list(&alice()).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].internal_id, "zaken/a");
    assert_eq!(records[1].internal_id, "zaken/b");
  }

  #[tokio::test]
  async fn list_detailed_reports_failed_connectors() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new("broken", Behaviour::Fail))
      .unwrap()
      .register(FakeConnector::new(
        "zaken",
        Behaviour::Records(vec![summary("zaken", "a")]),
      ))
      .unwrap()
      .build();

    let listing = aggregator.list_detailed(&alice()).await;
    assert!(listing.is_degraded());
    assert!(!listing.any_timed_out());
    assert_eq!(listing.failures.len(), 1);
    assert_eq!(listing.failures[0].connector_id, "broken");
    assert_eq!(listing.records.len(), 1);
  }

  #[tokio::test]
  async fn list_concatenates_in_registration_order() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new(
        "zaken",
        Behaviour::Records(vec![summary("zaken", "a")]),
      ))
      .unwrap()
      .register(FakeConnector::new(
        "submissions",
        Behaviour::Records(vec![summary("submissions", "s1")]),
      ))
      .unwrap()
      .build();

    let ids: Vec<_> = aggregator
      .list(&alice())
      .await
      .into_iter()
      .map(|s| s.internal_id)
      .collect();
    assert_eq!(ids, ["zaken/a", "submissions/s1"]);
    assert_eq!(
      aggregator.connector_ids().collect::<Vec<_>>(),
      ["zaken", "submissions"]
    );
  }

  #[tokio::test]
  async fn slow_connector_times_out_without_blocking_list() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new("slow", Behaviour::Hang))
      .unwrap()
      .register(FakeConnector::new(
        "zaken",
        Behaviour::Records(vec![summary("zaken", "a")]),
      ))
      .unwrap()
      .with_timeout(Duration::from_millis(20))
      .build();

    let listing = aggregator.list_detailed(&alice()).await;
    assert_eq!(listing.records.len(), 1);
    assert!(listing.any_timed_out());
  }

  #[tokio::test]
  async fn get_times_out_with_timeout_error() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new("slow", Behaviour::Hang))
      .unwrap()
      .with_timeout(Duration::from_millis(20))
      .build();

    let err = aggregator.get("slow", "a", &alice()).await.unwrap_err();
    assert!(err.is_timeout());
  }

  #[tokio::test]
  async fn get_routes_to_named_connector() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new(
        "zaken",
        Behaviour::Records(vec![summary("zaken", "a")]),
      ))
      .unwrap()
      .register(FakeConnector::new("broken", Behaviour::Fail))
      .unwrap()
      .build();

    let record = aggregator.get("zaken", "a", &alice()).await.unwrap();
    assert_eq!(record.unwrap().summary.internal_id, "zaken/a");

    let missing = aggregator.get("zaken", "zz", &alice()).await.unwrap();
    assert!(missing.is_none());

    let failed = aggregator.get("broken", "a", &alice()).await;
    assert!(matches!(failed, Err(Error::Backend { .. })));
  }

  #[tokio::test]
  async fn unknown_connector_is_an_error() {
    let aggregator = Aggregator::builder().build();

    let err = aggregator.get("nope", "a", &alice()).await.unwrap_err();
    assert!(matches!(err, Error::UnknownConnector(id) if id == "nope"));

    let err = aggregator
      .download("nope", "a", "f", &alice())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::UnknownConnector(_)));
  }

  #[tokio::test]
  async fn download_delegates_to_connector() {
    let aggregator = Aggregator::builder()
      .register(FakeConnector::new("zaken", Behaviour::Records(Vec::new())))
      .unwrap()
      .build();

    let file = aggregator
      .download("zaken", "a", "f1", &alice())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(file.url, "https://files.example/a/f1");
  }

  #[test]
  fn duplicate_registration_is_rejected() {
    let result = Aggregator::builder()
      .register(FakeConnector::new("zaken", Behaviour::Fail))
      .unwrap()
      .register(FakeConnector::new("zaken", Behaviour::Fail));
    assert!(matches!(result, Err(Error::DuplicateConnector(id)) if id == "zaken"));
  }
}
