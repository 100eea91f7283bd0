//! Presentation shaping for aggregated records.
//!
//! Everything here is pure: no I/O, no clock. Dates are rendered in Dutch
//! long form (`3 januari 2024`), which is what the portal's templates expect.

use std::cmp::Ordering;

use chrono::{Locale, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::record::{
  DocumentRef, RecordKind, RecordSummary, SingleRecord, StatusStep, TaskRef,
};

/// Render a date the way the portal shows it to citizens.
pub fn display_date(date: NaiveDate) -> String {
  Utc
    .from_utc_datetime(&date.and_time(NaiveTime::MIN))
    .format_localized("%-d %B %Y", Locale::nl_NL)
    .to_string()
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FormattedSummary {
  pub record:            RecordSummary,
  pub registration_date: String,
  pub planned_end_date:  Option<String>,
  pub forced_end_date:   Option<String>,
  pub end_date:          Option<String>,
}

impl From<&RecordSummary> for FormattedSummary {
  fn from(record: &RecordSummary) -> Self {
    Self {
      record:            record.clone(),
      registration_date: display_date(record.registration_date),
      planned_end_date:  record.planned_end_date.map(display_date),
      forced_end_date:   record.forced_end_date.map(display_date),
      end_date:          record.end_date.map(display_date),
    }
  }
}

/// Records split by whether they are still being handled.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormattedList {
  /// Records without an outcome, newest first.
  pub open:   Vec<FormattedSummary>,
  /// Records with an outcome, newest first.
  pub closed: Vec<FormattedSummary>,
}

pub fn format_list(records: &[RecordSummary]) -> FormattedList {
  let (mut open, mut closed): (Vec<&RecordSummary>, Vec<&RecordSummary>) =
    records.iter().partition(|r| r.is_open());

  open.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));
  closed.sort_by(|a, b| b.registration_date.cmp(&a.registration_date));

  FormattedList {
    open:   open.into_iter().map(FormattedSummary::from).collect(),
    closed: closed.into_iter().map(FormattedSummary::from).collect(),
  }
}

// ─── Single ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct FormattedDocument {
  pub document:          DocumentRef,
  pub registration_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedTask {
  pub task:     TaskRef,
  pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedRecord {
  #[serde(flatten)]
  pub summary:       FormattedSummary,
  pub kind:          RecordKind,
  pub statuses:      Option<Vec<StatusStep>>,
  pub documents:     Vec<FormattedDocument>,
  pub tasks:         Vec<FormattedTask>,
  /// Sorted surnames joined for display, e.g. `"Bakker, Jansen en Visser"`.
  pub assignees:     String,
  pub has_statuses:  bool,
  pub has_documents: bool,
  pub has_tasks:     bool,
  pub has_assignees: bool,
}

pub fn format_single(record: &SingleRecord) -> FormattedRecord {
  let mut documents: Vec<&DocumentRef> = record.documents.iter().collect();
  documents.sort_by(|a, b| document_order(a, b));

  let mut assignees: Vec<&str> =
    record.assignees.iter().map(String::as_str).collect();
  assignees.sort_unstable();

  FormattedRecord {
    summary:       FormattedSummary::from(&record.summary),
    kind:          record.kind,
    statuses:      record.statuses.clone(),
    documents:     documents
      .into_iter()
      .map(|d| FormattedDocument {
        document:          d.clone(),
        registration_date: d.registration_date.map(display_date),
      })
      .collect(),
    tasks:         record
      .tasks
      .iter()
      .map(|t| FormattedTask {
        task:     t.clone(),
        due_date: t.due_date.map(display_date),
      })
      .collect(),
    assignees:     join_names(&assignees),
    has_statuses:  record.statuses.as_ref().is_some_and(|s| !s.is_empty()),
    has_documents: !record.documents.is_empty(),
    has_tasks:     !record.tasks.is_empty(),
    has_assignees: !record.assignees.is_empty(),
  }
}

/// Explicit sort order first (ascending, present before absent), then
/// registration date (newest first, dated before undated), then title.
fn document_order(a: &DocumentRef, b: &DocumentRef) -> Ordering {
  present_first(a.sort_order, b.sort_order, |x, y| x.cmp(&y))
    .then_with(|| {
      present_first(a.registration_date, b.registration_date, |x, y| y.cmp(&x))
    })
    .then_with(|| a.title.cmp(&b.title))
}

fn present_first<T>(
  a: Option<T>,
  b: Option<T>,
  cmp: impl FnOnce(T, T) -> Ordering,
) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => cmp(a, b),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

fn join_names(names: &[&str]) -> String {
  match names {
    [] => String::new(),
    [only] => (*only).to_string(),
    [init @ .., last] => format!("{} en {last}", init.join(", ")),
  }
}
