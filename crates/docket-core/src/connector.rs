//! The [`Connector`] trait: the capability contract every backend adapter
//! implements.
//!
//! Higher layers ([`Aggregator`](crate::Aggregator)) depend on this
//! abstraction, never on a concrete backend. The trait is object safe so
//! heterogeneous connectors can share one registry.

use async_trait::async_trait;

use crate::{
  Identity, Result,
  record::{FileReference, RecordSummary, SingleRecord},
};

#[async_trait]
pub trait Connector: Send + Sync {
  /// Registry key; also the prefix of every `internal_id` this connector
  /// produces.
  fn id(&self) -> &str;

  /// All records visible to `identity`, in backend order. "No records" is an
  /// empty vector, never an error.
  async fn list(&self, identity: &Identity) -> Result<Vec<RecordSummary>>;

  /// A single record by its native id.
  ///
  /// Returns `None` both when the record does not exist and when `identity`
  /// may not see it. Callers cannot tell the two apart.
  async fn get(
    &self,
    record_id: &str,
    identity: &Identity,
  ) -> Result<Option<SingleRecord>>;

  /// A reference to one file belonging to a record, under the same
  /// not-found policy as [`Connector::get`].
  async fn download(
    &self,
    record_id: &str,
    file_id: &str,
    identity: &Identity,
  ) -> Result<Option<FileReference>>;
}
