//! Task sub-connector: outstanding actions for a case, kept in a separate
//! object store.

use chrono::NaiveDate;
use docket_client::PaginatingClient;
use docket_core::{Identity, Result, record::TaskRef};
use serde::Deserialize;
use tracing::debug;

const TASKS: &str = "api/v2/objects";
const OPEN: &str = "open";

#[derive(Debug, Deserialize)]
struct TaskObject {
  uuid:   String,
  record: TaskRecord,
}

#[derive(Debug, Deserialize)]
struct TaskRecord {
  data: TaskData,
}

#[derive(Debug, Deserialize)]
struct TaskData {
  titel:        String,
  status:       String,
  #[serde(default)]
  url:          Option<String>,
  #[serde(default)]
  verloopdatum: Option<NaiveDate>,
}

/// Looks up open tasks belonging to a case.
#[derive(Debug, Clone)]
pub struct TaskConnector {
  client:    PaginatingClient,
  delegated: bool,
}

impl TaskConnector {
  pub fn new(client: PaginatingClient) -> Self {
    Self { client, delegated: false }
  }

  /// Call the task backend with the caller's delegated token, when the
  /// identity carries one, instead of the configured credentials.
  pub fn with_delegated_token(mut self, delegated: bool) -> Self {
    self.delegated = delegated;
    self
  }

  /// Open tasks for the case at `case_url`, in backend order.
  pub async fn open_tasks(
    &self,
    case_url: &str,
    identity: &Identity,
  ) -> Result<Vec<TaskRef>> {
    let client = match identity.delegated_token() {
      Some(token) if self.delegated => self.client.with_bearer(token),
      _ => self.client.clone(),
    };

    let query = [("zaak", case_url.to_string()), ("status", OPEN.to_string())];
    let objects = client.get_all::<TaskObject>(TASKS, &query).await?.results;
    debug!(case = case_url, count = objects.len(), "fetched tasks");

    Ok(
      objects
        .into_iter()
        .filter(|o| o.record.data.status == OPEN)
        .map(|o| TaskRef {
          id:       o.uuid,
          title:    o.record.data.titel,
          url:      o.record.data.url,
          due_date: o.record.data.verloopdatum,
        })
        .collect(),
    )
  }
}
