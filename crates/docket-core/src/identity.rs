//! The authenticated party a request is made on behalf of.
//!
//! Identities are supplied per request by the caller and never cached.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A natural person, identified by citizen service number (BSN).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub bsn:             String,
  pub display_name:    String,
  /// Never serialized and redacted from `Debug` output.
  #[serde(default, skip_serializing)]
  pub delegated_token: Option<String>,
}

/// An organisation, identified by chamber-of-commerce number (KvK).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organisation {
  pub kvk:             String,
  pub display_name:    String,
  /// Never serialized and redacted from `Debug` output.
  #[serde(default, skip_serializing)]
  pub delegated_token: Option<String>,
}

fn redacted(token: &Option<String>) -> &'static str {
  if token.is_some() { "Some(<redacted>)" } else { "None" }
}

impl fmt::Debug for Person {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Person")
      .field("bsn", &self.bsn)
      .field("display_name", &self.display_name)
      .field("delegated_token", &format_args!("{}", redacted(&self.delegated_token)))
      .finish()
  }
}

impl fmt::Debug for Organisation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Organisation")
      .field("kvk", &self.kvk)
      .field("display_name", &self.display_name)
      .field("delegated_token", &format_args!("{}", redacted(&self.delegated_token)))
      .finish()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Identity {
  Person(Person),
  Organisation(Organisation),
}

impl Identity {
  pub fn person(bsn: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self::Person(Person {
      bsn:             bsn.into(),
      display_name:    display_name.into(),
      delegated_token: None,
    })
  }

  pub fn organisation(
    kvk: impl Into<String>,
    display_name: impl Into<String>,
  ) -> Self {
    Self::Organisation(Organisation {
      kvk:             kvk.into(),
      display_name:    display_name.into(),
      delegated_token: None,
    })
  }

  /// Attach a delegated-access token, used by connectors that call their
  /// backend with per-user bearer credentials.
  pub fn with_delegated_token(mut self, token: impl Into<String>) -> Self {
    let token = Some(token.into());
    match &mut self {
      Self::Person(p) => p.delegated_token = token,
      Self::Organisation(o) => o.delegated_token = token,
    }
    self
  }

  /// The BSN or KvK number.
  pub fn identifier(&self) -> &str {
    match self {
      Self::Person(p) => &p.bsn,
      Self::Organisation(o) => &o.kvk,
    }
  }

  pub fn display_name(&self) -> &str {
    match self {
      Self::Person(p) => &p.display_name,
      Self::Organisation(o) => &o.display_name,
    }
  }

  pub fn delegated_token(&self) -> Option<&str> {
    match self {
      Self::Person(p) => p.delegated_token.as_deref(),
      Self::Organisation(o) => o.delegated_token.as_deref(),
    }
  }
}
