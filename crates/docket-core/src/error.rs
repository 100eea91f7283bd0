//! Error types shared by every Docket crate.
//!
//! "Not found" is not an error: lookups return `Ok(None)` both when a record
//! does not exist and when the caller may not see it.

use std::time::Duration;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Unreachable or malformed backend, including failed schema validation.
  #[error("backend error: {message}")]
  Backend {
    message: String,
    #[source]
    source:  Option<BoxError>,
  },

  /// A deadline imposed on the call was exceeded.
  #[error("timed out after {0:?}")]
  Timeout(Duration),

  #[error("unknown connector: {0:?}")]
  UnknownConnector(String),

  #[error("connector {0:?} is already registered")]
  DuplicateConnector(String),
}

impl Error {
  /// A backend failure without an underlying cause.
  pub fn backend(message: impl Into<String>) -> Self {
    Self::Backend { message: message.into(), source: None }
  }

  /// A backend failure caused by `source`.
  pub fn backend_with(
    message: impl Into<String>,
    source: impl Into<BoxError>,
  ) -> Self {
    Self::Backend { message: message.into(), source: Some(source.into()) }
  }

  pub fn is_timeout(&self) -> bool { matches!(self, Self::Timeout(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
