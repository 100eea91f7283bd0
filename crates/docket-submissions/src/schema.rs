//! Decode-or-fail handling of submission payloads.

use chrono::{DateTime, Utc};
use docket_core::{Error, Identity, Result};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub key:          String,
  pub reference:    String,
  pub form_title:   String,
  pub submitted_at: DateTime<Utc>,
  /// Storage key of the document generated from the submitted form.
  pub pdf:          String,
  #[serde(default)]
  pub attachments:  Vec<String>,
  #[serde(default)]
  pub bsn:          Option<String>,
  #[serde(default)]
  pub kvk:          Option<String>,
}

impl Submission {
  /// Whether `identity` is the party that made this submission.
  pub fn is_owned_by(&self, identity: &Identity) -> bool {
    match identity {
      Identity::Person(p) => self.bsn.as_deref() == Some(p.bsn.as_str()),
      Identity::Organisation(o) => self.kvk.as_deref() == Some(o.kvk.as_str()),
    }
  }

  /// Whether `file_id` is one of the files belonging to this submission.
  pub fn has_file(&self, file_id: &str) -> bool {
    self.pdf == file_id || self.attachments.iter().any(|a| a == file_id)
  }

  fn validate(&self) -> Result<()> {
    if self.key.trim().is_empty() || !is_safe_key(&self.key) {
      return Err(Error::backend(format!("invalid submission key {:?}", self.key)));
    }
    if self.reference.trim().is_empty() {
      return Err(Error::backend(format!("submission {} has no reference", self.key)));
    }
    if let Some(bad) = std::iter::once(&self.pdf)
      .chain(&self.attachments)
      .find(|k| !is_safe_key(k))
    {
      return Err(Error::backend(format!(
        "submission {} has invalid file key {bad:?}",
        self.key
      )));
    }
    Ok(())
  }
}

/// A signed, time-limited download location.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrl {
  pub url:        String,
  pub expires_at: DateTime<Utc>,
}

/// A storage key that cannot address anything outside its submission.
pub fn is_safe_key(key: &str) -> bool {
  !key.is_empty() && !key.contains(['/', '\\']) && !key.contains("..")
}

/// Decode `value` as `T`, reporting the JSON path of the first mismatch.
pub fn decode<T: DeserializeOwned>(what: &str, value: Value) -> Result<T> {
  serde_path_to_error::deserialize(value).map_err(|e| {
    let path = e.path().to_string();
    Error::backend_with(format!("invalid {what} at {path}"), e.into_inner())
  })
}

pub fn decode_submission(value: Value) -> Result<Submission> {
  let submission: Submission = decode("submission", value)?;
  submission.validate()?;
  Ok(submission)
}

pub fn decode_submissions(value: Value) -> Result<Vec<Submission>> {
  let submissions: Vec<Submission> = decode("submission list", value)?;
  for submission in &submissions {
    submission.validate()?;
  }
  Ok(submissions)
}
