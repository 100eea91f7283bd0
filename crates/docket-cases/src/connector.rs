//! [`CaseConnector`] — the [`Connector`] implementation for the
//! case-management backend.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use docket_client::PaginatingClient;
use docket_core::{
  Connector, Identity, Result,
  record::{
    DocumentRef, FileReference, RecordKind, RecordSummary, SingleRecord,
    TaskRef, composite_id,
  },
};
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  metadata::{DomainAllowList, ReferenceMetadata},
  progression::status_progression,
  tasks::TaskConnector,
  wire::{
    CASE_DOCUMENTS, CASES, Case, CaseDocument, Document, Outcome, ROLES, Role,
    Status,
  },
};

pub const DEFAULT_ID: &str = "zaken";

/// Label used when a case references a type the catalogue does not know.
const UNKNOWN: &str = "Onbekend";

/// Generic role description of the employees handling a case.
const HANDLER_ROLE: &str = "behandelaar";

const PERSON_CASE_FILTER: &str = "rol__betrokkeneIdentificatie__natuurlijkPersoon__inpBsn";
const PERSON_ROLE_FILTER: &str = "betrokkeneIdentificatie__natuurlijkPersoon__inpBsn";
const ORGANISATION_ROLE_FILTER: &str =
  "betrokkeneIdentificatie__nietNatuurlijkPersoon__innNnpId";

// ─── Connector ───────────────────────────────────────────────────────────────

/// Connector for the case-management backend.
///
/// Configure it with the `with_*` methods before registering it; it is not
/// reconfigured afterwards.
pub struct CaseConnector {
  id:              String,
  client:          PaginatingClient,
  metadata:        OnceCell<ReferenceMetadata>,
  allowed_domains: Option<DomainAllowList>,
  show_documents:  bool,
  tasks:           Option<TaskConnector>,
}

/// A loaded case together with the document objects behind its references.
struct Loaded {
  record:    SingleRecord,
  documents: Vec<Document>,
}

impl CaseConnector {
  pub fn new(client: PaginatingClient) -> Self {
    Self {
      id: DEFAULT_ID.to_string(),
      client,
      metadata: OnceCell::new(),
      allowed_domains: None,
      show_documents: false,
      tasks: None,
    }
  }

  pub fn with_id(mut self, id: impl Into<String>) -> Self {
    self.id = id.into();
    self
  }

  /// Only expose case types that belong to a catalogue of one of `domains`.
  pub fn with_allowed_domains<I, S>(mut self, domains: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.allowed_domains = Some(DomainAllowList::new(domains));
    self
  }

  /// Include case documents in detail views and allow downloading them.
  pub fn with_documents(mut self, show: bool) -> Self {
    self.show_documents = show;
    self
  }

  pub fn with_tasks(mut self, tasks: TaskConnector) -> Self {
    self.tasks = Some(tasks);
    self
  }

  /// Load the reference metadata on first use.
  ///
  /// Concurrent first callers share a single in-flight fetch. A failed fetch
  /// is not cached; the next caller tries again.
  async fn ensure_metadata(&self) -> Result<&ReferenceMetadata> {
    self
      .metadata
      .get_or_try_init(|| ReferenceMetadata::fetch(&self.client))
      .await
  }

  fn is_visible(&self, metadata: &ReferenceMetadata, case_type: &str) -> bool {
    self
      .allowed_domains
      .as_ref()
      .is_none_or(|allow| allow.admits(metadata, case_type))
  }

  /// Canonical URL of a case, as role assignments refer to it. Recomputed
  /// from the configured base URL on every call.
  fn case_url(&self, uuid: Uuid) -> Result<String> {
    Ok(self.client.url_for(&format!("{CASES}/{uuid}"))?.to_string())
  }

  // ── Listing ─────────────────────────────────────────────────────────────

  /// Every case `identity` is involved in, in backend order.
  ///
  /// Persons are looked up with a single case query. The backend offers no
  /// such query for organisations, so their role assignments are listed and
  /// each referenced case is fetched individually.
  async fn cases_for(&self, identity: &Identity) -> Result<Vec<Case>> {
    match identity {
      Identity::Person(person) => {
        let query = [(PERSON_CASE_FILTER, person.bsn.clone())];
        Ok(self.client.get_all::<Case>(CASES, &query).await?.results)
      }
      Identity::Organisation(organisation) => {
        let query = [
          (ORGANISATION_ROLE_FILTER, organisation.kvk.clone()),
          ("betrokkeneType", "niet_natuurlijk_persoon".to_string()),
        ];
        let roles = self.client.get_all::<Role>(ROLES, &query).await?.results;

        let mut seen = HashSet::new();
        let case_urls: Vec<String> = roles
          .into_iter()
          .map(|role| role.zaak)
          .filter(|url| seen.insert(url.clone()))
          .collect();
        debug!(count = case_urls.len(), "fetching organisation cases individually");

        let cases = try_join_all(
          case_urls
            .iter()
            .map(|url| self.client.get_one::<Case>(url, &[])),
        )
        .await?;
        Ok(cases.into_iter().flatten().collect())
      }
    }
  }

  /// Resolve the distinct status and outcome references of `cases`
  /// concurrently. References the backend no longer knows are left out.
  async fn resolve_references(
    &self,
    cases: &[Case],
  ) -> Result<(HashMap<String, Status>, HashMap<String, Outcome>)> {
    let status_urls: HashSet<&str> =
      cases.iter().filter_map(|c| c.status.as_deref()).collect();
    let outcome_urls: HashSet<&str> =
      cases.iter().filter_map(|c| c.resultaat.as_deref()).collect();

    let (statuses, outcomes) = tokio::try_join!(
      try_join_all(status_urls.iter().map(|url| async move {
        let status = self.client.get_one::<Status>(url, &[]).await?;
        Ok::<_, docket_core::Error>(status.map(|s| (url.to_string(), s)))
      })),
      try_join_all(outcome_urls.iter().map(|url| async move {
        let outcome = self.client.get_one::<Outcome>(url, &[]).await?;
        Ok::<_, docket_core::Error>(outcome.map(|o| (url.to_string(), o)))
      })),
    )?;

    Ok((
      statuses.into_iter().flatten().collect(),
      outcomes.into_iter().flatten().collect(),
    ))
  }

  fn summarize(
    &self,
    metadata: &ReferenceMetadata,
    case: &Case,
    status: Option<&Status>,
    outcome: Option<&Outcome>,
  ) -> RecordSummary {
    let case_type = match metadata.case_types.get(&case.zaaktype) {
      Some(t) => t.omschrijving.clone(),
      None => {
        warn!(case = %case.identificatie, case_type = %case.zaaktype, "unknown case type");
        UNKNOWN.to_string()
      }
    };

    let status = status.and_then(|s| match metadata.status_types.get(&s.statustype) {
      Some(t) => Some(t.omschrijving.clone()),
      None => {
        warn!(
          case = %case.identificatie,
          status_type = %s.statustype,
          "unknown status type"
        );
        None
      }
    });

    // A case with an outcome reference is closed, whether or not the outcome
    // itself can be resolved.
    let outcome = case.resultaat.as_ref().map(|_| {
      outcome
        .and_then(|o| metadata.outcome_types.get(&o.resultaattype))
        .map(|t| t.omschrijving.clone())
        .unwrap_or_else(|| {
          warn!(case = %case.identificatie, "unresolvable outcome");
          UNKNOWN.to_string()
        })
    });

    RecordSummary {
      identifier: case.identificatie.clone(),
      internal_id: composite_id(&self.id, &case.uuid),
      title: case.omschrijving.clone().filter(|t| !t.is_empty()),
      registration_date: case.registratiedatum,
      planned_end_date: case.einddatum_gepland,
      forced_end_date: case.uiterlijke_einddatum_afdoening,
      end_date: case.einddatum,
      case_type,
      status,
      outcome,
    }
  }

  // ── Detail ──────────────────────────────────────────────────────────────

  async fn load(&self, record_id: &str, identity: &Identity) -> Result<Option<Loaded>> {
    let Ok(uuid) = Uuid::parse_str(record_id) else {
      return Ok(None);
    };
    let metadata = self.ensure_metadata().await?;
    let case_url = self.case_url(uuid)?;

    let role_query = authorization_query(identity, &case_url);
    let (case, roles) = tokio::try_join!(
      self.client.get_one::<Case>(&case_url, &[]),
      self.client.get_all::<Role>(ROLES, &role_query),
    )?;

    let Some(case) = case else {
      return Ok(None);
    };
    if !self.is_visible(metadata, &case.zaaktype) {
      debug!(case = %case.identificatie, "case type outside allowed domains");
      return Ok(None);
    }
    if !roles.results.iter().any(|role| role.zaak == case_url) {
      debug!(case = %case.identificatie, "no role assignment for caller");
      return Ok(None);
    }

    let (status, outcome, documents, tasks, assignees) = tokio::try_join!(
      self.fetch_optional::<Status>(case.status.as_deref()),
      self.fetch_optional::<Outcome>(case.resultaat.as_deref()),
      self.documents(&case_url),
      self.open_tasks(&case_url, identity),
      self.assignees(&case_url),
    )?;

    let statuses = metadata.case_types.get(&case.zaaktype).and_then(|t| {
      status_progression(
        &t.statustypen,
        metadata.status_types.values(),
        status.as_ref().map(|s| s.statustype.as_str()),
      )
    });

    let record = SingleRecord {
      summary: self.summarize(metadata, &case, status.as_ref(), outcome.as_ref()),
      statuses,
      documents: documents.iter().map(document_ref).collect(),
      tasks,
      assignees,
      kind: RecordKind::Case,
    };
    Ok(Some(Loaded { record, documents }))
  }

  async fn fetch_optional<T>(&self, url: Option<&str>) -> Result<Option<T>>
  where
    T: DeserializeOwned,
  {
    match url {
      Some(url) => self.client.get_one::<T>(url, &[]).await,
      None => Ok(None),
    }
  }

  async fn documents(&self, case_url: &str) -> Result<Vec<Document>> {
    if !self.show_documents {
      return Ok(Vec::new());
    }
    let query = [("zaak", case_url.to_string())];
    let links = self
      .client
      .get_all::<CaseDocument>(CASE_DOCUMENTS, &query)
      .await?;

    let documents = try_join_all(
      links
        .results
        .iter()
        .map(|link| self.client.get_one::<Document>(&link.informatieobject, &[])),
    )
    .await?;
    Ok(documents.into_iter().flatten().collect())
  }

  async fn open_tasks(&self, case_url: &str, identity: &Identity) -> Result<Vec<TaskRef>> {
    match &self.tasks {
      Some(tasks) => tasks.open_tasks(case_url, identity).await,
      None => Ok(Vec::new()),
    }
  }

  /// Surnames of the employees handling the case.
  async fn assignees(&self, case_url: &str) -> Result<Vec<String>> {
    let query = [
      ("zaak", case_url.to_string()),
      ("omschrijvingGeneriek", HANDLER_ROLE.to_string()),
    ];
    let roles = self.client.get_all::<Role>(ROLES, &query).await?.results;
    Ok(
      roles
        .into_iter()
        .filter(|role| role.omschrijving_generiek.as_deref() == Some(HANDLER_ROLE))
        .filter_map(|role| role.betrokkene_identificatie?.geslachtsnaam)
        .collect(),
    )
  }
}

/// Role-assignment query linking `identity` to the case at `case_url`.
fn authorization_query(identity: &Identity, case_url: &str) -> [(&'static str, String); 2] {
  let party = match identity {
    Identity::Person(person) => (PERSON_ROLE_FILTER, person.bsn.clone()),
    Identity::Organisation(organisation) => {
      (ORGANISATION_ROLE_FILTER, organisation.kvk.clone())
    }
  };
  [("zaak", case_url.to_string()), party]
}

fn document_ref(document: &Document) -> DocumentRef {
  DocumentRef {
    id:                document.id().to_string(),
    title:             document.titel.clone(),
    file_name:         document.bestandsnaam.clone(),
    registration_date: document.creatiedatum,
    sort_order:        None,
  }
}

// ─── Connector impl ──────────────────────────────────────────────────────────

#[async_trait]
impl Connector for CaseConnector {
  fn id(&self) -> &str { &self.id }

  async fn list(&self, identity: &Identity) -> Result<Vec<RecordSummary>> {
    let metadata = self.ensure_metadata().await?;

    let cases: Vec<Case> = self
      .cases_for(identity)
      .await?
      .into_iter()
      .filter(|case| self.is_visible(metadata, &case.zaaktype))
      .collect();

    let (statuses, outcomes) = self.resolve_references(&cases).await?;

    Ok(
      cases
        .iter()
        .map(|case| {
          let status = case.status.as_ref().and_then(|url| statuses.get(url));
          let outcome = case.resultaat.as_ref().and_then(|url| outcomes.get(url));
          self.summarize(metadata, case, status, outcome)
        })
        .collect(),
    )
  }

  async fn get(
    &self,
    record_id: &str,
    identity: &Identity,
  ) -> Result<Option<SingleRecord>> {
    Ok(self.load(record_id, identity).await?.map(|loaded| loaded.record))
  }

  async fn download(
    &self,
    record_id: &str,
    file_id: &str,
    identity: &Identity,
  ) -> Result<Option<FileReference>> {
    let Some(loaded) = self.load(record_id, identity).await? else {
      return Ok(None);
    };

    Ok(
      loaded
        .documents
        .into_iter()
        .find(|document| document.id() == file_id)
        .map(|document| FileReference {
          url:        document
            .inhoud
            .unwrap_or_else(|| format!("{}/download", document.url)),
          file_name:  document.bestandsnaam,
          expires_at: None,
        }),
    )
  }
}
