//! Record shapes produced by connectors.
//!
//! Every connector projects its backend data onto these types so results
//! from different backends can be merged and sorted together.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Build the internal `<connector-id>/<native-id>` identifier.
pub fn composite_id(connector_id: &str, native_id: &str) -> String {
  format!("{connector_id}/{native_id}")
}

// ─── List view ───────────────────────────────────────────────────────────────

/// The list-view projection of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSummary {
  /// Human-facing case number.
  pub identifier:        String,
  /// `<connector-id>/<native-id>`.
  pub internal_id:       String,
  pub title:             Option<String>,
  pub registration_date: NaiveDate,
  pub planned_end_date:  Option<NaiveDate>,
  /// The latest date by which the case must legally be settled.
  pub forced_end_date:   Option<NaiveDate>,
  pub end_date:          Option<NaiveDate>,
  pub case_type:         String,
  pub status:            Option<String>,
  /// `None` exactly when the record is still open.
  pub outcome:           Option<String>,
}

impl RecordSummary {
  pub fn is_open(&self) -> bool { self.outcome.is_none() }
}

// ─── Detail view ─────────────────────────────────────────────────────────────

/// Which kind of backend produced a [`SingleRecord`]. For display branching
/// only; never consulted for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
  Case,
  Submission,
}

/// One stage of a record's status progression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusStep {
  pub status_type: String,
  pub label:       String,
  pub sequence:    u32,
  pub is_final:    bool,
  pub completed:   bool,
  pub current:     bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
  pub id:                String,
  pub title:             String,
  pub file_name:         Option<String>,
  pub registration_date: Option<NaiveDate>,
  /// Explicit position; lower values sort first.
  pub sort_order:        Option<i32>,
}

/// An outstanding action the party has to take on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
  pub id:       String,
  pub title:    String,
  pub url:      Option<String>,
  pub due_date: Option<NaiveDate>,
}

/// The detail-view projection of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleRecord {
  #[serde(flatten)]
  pub summary:   RecordSummary,
  /// `None` when the record has no current status yet, which is distinct
  /// from an empty progression.
  pub statuses:  Option<Vec<StatusStep>>,
  pub documents: Vec<DocumentRef>,
  pub tasks:     Vec<TaskRef>,
  /// Surnames of the handlers assigned to the record.
  pub assignees: Vec<String>,
  pub kind:      RecordKind,
}

// ─── Downloads ───────────────────────────────────────────────────────────────

/// An opaque, possibly time-limited pointer to file content. File bytes never
/// pass through this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
  pub url:        String,
  pub file_name:  Option<String>,
  pub expires_at: Option<DateTime<Utc>>,
}
