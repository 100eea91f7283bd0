//! [`SubmissionConnector`] — the [`Connector`] implementation for the
//! submission-storage backend.

use async_trait::async_trait;
use docket_client::PaginatingClient;
use docket_core::{
  Connector, Error, Identity, Result,
  record::{
    DocumentRef, FileReference, RecordKind, RecordSummary, SingleRecord,
    composite_id,
  },
};
use serde_json::Value;
use tracing::debug;

use crate::schema::{
  DownloadUrl, Submission, decode, decode_submission, decode_submissions,
  is_safe_key,
};

pub const DEFAULT_ID: &str = "submissions";

/// Status label of every submission: the backend only stores what has been
/// received.
const RECEIVED: &str = "Ontvangen";

const SUBMISSIONS: &str = "submissions";

/// Connector for form submissions.
///
/// Expects a [`PaginatingClient`] configured with the backend's API key.
pub struct SubmissionConnector {
  id:     String,
  client: PaginatingClient,
}

impl SubmissionConnector {
  pub fn new(client: PaginatingClient) -> Self {
    Self { id: DEFAULT_ID.to_string(), client }
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = id.into();
    self
  }

  /// The submission `id` as seen by `identity`, or `None` if it does not
  /// exist or belongs to someone else.
  async fn fetch(&self, id: &str, identity: &Identity) -> Result<Option<Submission>> {
    if !is_safe_key(id) {
      return Ok(None);
    }
    let Some(value) = self
      .client
      .get_one::<Value>(&format!("{SUBMISSIONS}/{id}"), &[owner_filter(identity)])
      .await?
    else {
      return Ok(None);
    };

    let submission = decode_submission(value)?;
    if submission.key != id || !submission.is_owned_by(identity) {
      debug!(submission = id, "submission not owned by caller");
      return Ok(None);
    }
    Ok(Some(submission))
  }

  fn summarize(&self, submission: &Submission) -> RecordSummary {
    RecordSummary {
      identifier:        submission.reference.clone(),
      internal_id:       composite_id(&self.id, &submission.key),
      title:             None,
      registration_date: submission.submitted_at.date_naive(),
      planned_end_date:  None,
      forced_end_date:   None,
      end_date:          None,
      case_type:         submission.form_title.clone(),
      status:            Some(RECEIVED.to_string()),
      outcome:           None,
    }
  }
}

fn owner_filter(identity: &Identity) -> (&'static str, String) {
  match identity {
    Identity::Person(p) => ("bsn", p.bsn.clone()),
    Identity::Organisation(o) => ("kvk", o.kvk.clone()),
  }
}

/// Attachments in submission order, followed by the generated document.
///
/// The generated document gets the lowest sort order so it is shown first
/// once documents are sorted for display.
fn documents(submission: &Submission) -> Vec<DocumentRef> {
  let submitted = Some(submission.submitted_at.date_naive());

  let mut documents: Vec<DocumentRef> = submission
    .attachments
    .iter()
    .zip(1..)
    .map(|(key, order)| DocumentRef {
      id:                key.clone(),
      title:             key.clone(),
      file_name:         Some(key.clone()),
      registration_date: submitted,
      sort_order:        Some(order),
    })
    .collect();

  documents.push(DocumentRef {
    id:                submission.pdf.clone(),
    title:             submission.form_title.clone(),
    file_name:         Some(format!("{}.pdf", submission.reference)),
    registration_date: submitted,
    sort_order:        Some(0),
  });
  documents
}

#[async_trait]
impl Connector for SubmissionConnector {
  fn id(&self) -> &str { &self.id }

  async fn list(&self, identity: &Identity) -> Result<Vec<RecordSummary>> {
    let value = self
      .client
      .get_one::<Value>(SUBMISSIONS, &[owner_filter(identity)])
      .await?
      .ok_or_else(|| Error::backend("submission listing endpoint not found"))?;

    let submissions = decode_submissions(value)?;
    if let Some(foreign) = submissions.iter().find(|s| !s.is_owned_by(identity)) {
      return Err(Error::backend(format!(
        "backend returned submission {} of another party",
        foreign.key
      )));
    }

    Ok(submissions.iter().map(|s| self.summarize(s)).collect())
  }

  async fn get(
    &self,
    record_id: &str,
    identity: &Identity,
  ) -> Result<Option<SingleRecord>> {
    Ok(self.fetch(record_id, identity).await?.map(|submission| SingleRecord {
      summary:   self.summarize(&submission),
      statuses:  None,
      documents: documents(&submission),
      tasks:     Vec::new(),
      assignees: Vec::new(),
      kind:      RecordKind::Submission,
    }))
  }

  async fn download(
    &self,
    record_id: &str,
    file_id: &str,
    identity: &Identity,
  ) -> Result<Option<FileReference>> {
    let Some(submission) = self.fetch(record_id, identity).await? else {
      return Ok(None);
    };
    if !submission.has_file(file_id) {
      debug!(submission = record_id, "requested file is not part of submission");
      return Ok(None);
    }

    let Some(value) = self
      .client
      .get_one::<Value>(
        &format!("{SUBMISSIONS}/{}/download-url", submission.key),
        &[("key", file_id.to_string())],
      )
      .await?
    else {
      return Ok(None);
    };
    let signed: DownloadUrl = decode("download url", value)?;

    let file_name = if file_id == submission.pdf {
      format!("{}.pdf", submission.reference)
    } else {
      file_id.to_string()
    };
    Ok(Some(FileReference {
      url:        signed.url,
      file_name:  Some(file_name),
      expires_at: Some(signed.expires_at),
    }))
  }
}
