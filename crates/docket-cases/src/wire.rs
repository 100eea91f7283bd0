//! Wire shapes of the case-management backend.
//!
//! Only the fields this crate reads are declared; everything else in the
//! backend's payloads is ignored. A payload missing a declared field fails to
//! decode and surfaces as a backend error.

use chrono::NaiveDate;
use serde::Deserialize;

// ─── Resource paths ──────────────────────────────────────────────────────────

pub const CASE_TYPES: &str = "catalogi/api/v1/zaaktypen";
pub const STATUS_TYPES: &str = "catalogi/api/v1/statustypen";
pub const OUTCOME_TYPES: &str = "catalogi/api/v1/resultaattypen";
pub const CATALOGS: &str = "catalogi/api/v1/catalogussen";
pub const CASES: &str = "zaken/api/v1/zaken";
pub const ROLES: &str = "zaken/api/v1/rollen";
pub const CASE_DOCUMENTS: &str = "zaken/api/v1/zaakinformatieobjecten";

// ─── Catalogue ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CaseType {
  pub url:          String,
  pub omschrijving: String,
  /// Status types of this case type, by URL.
  #[serde(default)]
  pub statustypen:  Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusType {
  pub url:           String,
  pub omschrijving:  String,
  pub volgnummer:    u32,
  #[serde(default)]
  pub is_eindstatus: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutcomeType {
  pub url:          String,
  pub omschrijving: String,
}

/// A domain catalogue grouping case types.
#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
  pub domein:    String,
  #[serde(default)]
  pub zaaktypen: Vec<String>,
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
  pub uuid:                           String,
  pub identificatie:                  String,
  #[serde(default)]
  pub omschrijving:                   Option<String>,
  pub zaaktype:                       String,
  pub registratiedatum:               NaiveDate,
  #[serde(default)]
  pub einddatum_gepland:              Option<NaiveDate>,
  #[serde(default)]
  pub uiterlijke_einddatum_afdoening: Option<NaiveDate>,
  #[serde(default)]
  pub einddatum:                      Option<NaiveDate>,
  #[serde(default)]
  pub status:                         Option<String>,
  #[serde(default)]
  pub resultaat:                      Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
  pub statustype: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
  pub resultaattype: String,
}

/// A role assignment linking a party to a case.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
  pub zaak:                     String,
  #[serde(default)]
  pub omschrijving_generiek:    Option<String>,
  #[serde(default)]
  pub betrokkene_identificatie: Option<RoleParty>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleParty {
  /// `geslachtsnaam` for natural persons, `achternaam` for employees.
  #[serde(default, alias = "achternaam")]
  pub geslachtsnaam: Option<String>,
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Link between a case and a document object.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseDocument {
  pub informatieobject: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
  pub url:          String,
  pub titel:        String,
  #[serde(default)]
  pub bestandsnaam: Option<String>,
  #[serde(default)]
  pub creatiedatum: Option<NaiveDate>,
  /// Download location of the document content.
  #[serde(default)]
  pub inhoud:       Option<String>,
}

impl Document {
  /// The document's own id: the last segment of its URL.
  pub fn id(&self) -> &str {
    self
      .url
      .trim_end_matches('/')
      .rsplit('/')
      .next()
      .unwrap_or_default()
  }
}
