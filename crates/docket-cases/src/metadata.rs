//! Reference metadata: the catalogues every case lookup resolves against.

use std::collections::{HashMap, HashSet};

use docket_client::PaginatingClient;
use docket_core::Result;
use tracing::info;

use crate::wire::{
  CASE_TYPES, CATALOGS, CaseType, Catalog, OUTCOME_TYPES, OutcomeType,
  STATUS_TYPES, StatusType,
};

/// Case types, status types, outcome types and domain catalogues, keyed by
/// URL where the backend refers to them by URL.
#[derive(Debug, Default)]
pub struct ReferenceMetadata {
  pub case_types:    HashMap<String, CaseType>,
  pub status_types:  HashMap<String, StatusType>,
  pub outcome_types: HashMap<String, OutcomeType>,
  pub catalogs:      Vec<Catalog>,
}

impl ReferenceMetadata {
  /// Fetch all four catalogues concurrently.
  pub async fn fetch(client: &PaginatingClient) -> Result<Self> {
    let (case_types, status_types, outcome_types, catalogs) = tokio::try_join!(
      client.get_all::<CaseType>(CASE_TYPES, &[]),
      client.get_all::<StatusType>(STATUS_TYPES, &[]),
      client.get_all::<OutcomeType>(OUTCOME_TYPES, &[]),
      client.get_all::<Catalog>(CATALOGS, &[]),
    )?;

    let metadata = Self {
      case_types:    by_url(case_types.results, |t| &t.url),
      status_types:  by_url(status_types.results, |t| &t.url),
      outcome_types: by_url(outcome_types.results, |t| &t.url),
      catalogs:      catalogs.results,
    };
    info!(
      case_types = metadata.case_types.len(),
      status_types = metadata.status_types.len(),
      outcome_types = metadata.outcome_types.len(),
      catalogs = metadata.catalogs.len(),
      "loaded reference metadata"
    );
    Ok(metadata)
  }
}

fn by_url<T>(items: Vec<T>, url: impl Fn(&T) -> &String) -> HashMap<String, T> {
  items.into_iter().map(|item| (url(&item).clone(), item)).collect()
}

// ─── Domain allow-list ───────────────────────────────────────────────────────

/// The set of domains whose case types a connector instance exposes.
///
/// This is a tenant boundary applied to every caller alike, not a per-user
/// permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAllowList(HashSet<String>);

impl DomainAllowList {
  pub fn new<I, S>(domains: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(domains.into_iter().map(Into::into).collect())
  }

  /// Whether some catalogue lists `case_type` under an allowed domain.
  pub fn admits(&self, metadata: &ReferenceMetadata, case_type: &str) -> bool {
    metadata.catalogs.iter().any(|catalog| {
      self.0.contains(&catalog.domein)
        && catalog.zaaktypen.iter().any(|t| t == case_type)
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn catalog(domain: &str, case_types: &[&str]) -> Catalog {
    Catalog {
      domein:    domain.into(),
      zaaktypen: case_types.iter().map(|s| s.to_string()).collect(),
    }
  }

  fn metadata() -> ReferenceMetadata {
    ReferenceMetadata {
      catalogs: vec![
        catalog("JZ", &["zt/bezwaar", "zt/beroep"]),
        catalog("APV", &["zt/bingo"]),
      ],
      ..Default::default()
    }
  }

  #[test]
  fn admits_case_types_of_allowed_domains_only() {
    let allow = DomainAllowList::new(["JZ"]);
    let meta = metadata();
    assert!(allow.admits(&meta, "zt/bezwaar"));
    assert!(allow.admits(&meta, "zt/beroep"));
    assert!(!allow.admits(&meta, "zt/bingo"));
  }

  #[test]
  fn unlisted_case_type_is_not_admitted() {
    let allow = DomainAllowList::new(["JZ", "APV"]);
    assert!(!allow.admits(&metadata(), "zt/unknown"));
  }

  #[test]
  fn empty_allow_list_admits_nothing() {
    let allow = DomainAllowList::new(Vec::<String>::new());
    assert!(!allow.admits(&metadata(), "zt/bezwaar"));
  }
}
