//! Tests for `SubmissionConnector` against a wiremock submission backend.

use docket_client::{ClientConfig, Credentials, PaginatingClient};
use docket_core::{
  Connector, Error, Identity, format::format_single, record::RecordKind,
};
use serde_json::{Value, json};
use wiremock::{
  Mock, MockServer, ResponseTemplate,
  matchers::{header, method, path, query_param},
};

use crate::SubmissionConnector;

const BSN: &str = "999990019";
const KVK: &str = "69599084";

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn alice() -> Identity { Identity::person(BSN, "Alice") }

fn bob() -> Identity { Identity::person("111222333", "Bob") }

fn acme() -> Identity { Identity::organisation(KVK, "Acme BV") }

fn connector(server: &MockServer) -> SubmissionConnector {
  let client = PaginatingClient::new(
    ClientConfig::new(server.uri()).with_credentials(Credentials::ApiKey {
      header: "x-api-key".into(),
      value:  "secret".into(),
    }),
  )
  .expect("client");
  SubmissionConnector::new(client)
}

fn s123() -> Value {
  json!({
    "key": "s123",
    "reference": "OF-AB12CD",
    "formTitle": "Melding openbare ruimte",
    "submittedAt": "2024-01-03T10:15:00Z",
    "pdf": "s123",
    "attachments": ["a.pdf", "b.pdf"],
    "bsn": BSN,
  })
}

fn s456() -> Value {
  json!({
    "key": "s456",
    "reference": "OF-XY98ZW",
    "formTitle": "Aanvraag parkeervergunning",
    "submittedAt": "2023-11-20T08:00:00Z",
    "pdf": "s456",
    "bsn": BSN,
  })
}

async fn mount_list(server: &MockServer, owner: (&str, &str), body: Value) {
  Mock::given(method("GET"))
    .and(path("/submissions"))
    .and(query_param(owner.0, owner.1))
    .respond_with(ResponseTemplate::new(200).set_body_json(body))
    .mount(server)
    .await;
}

async fn mount_submission(server: &MockServer, key: &str, body: Value) {
  Mock::given(method("GET"))
    .and(path(format!("/submissions/{key}")))
    .respond_with(ResponseTemplate::new(200).set_body_json(body))
    .mount(server)
    .await;
}

async fn mount_download_url(server: &MockServer, key: &str, expected: u64) {
  Mock::given(method("GET"))
    .and(path(format!("/submissions/{key}/download-url")))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "url": "https://storage.example/signed/a.pdf?sig=abc",
      "expiresAt": "2024-01-03T10:30:00Z",
    })))
    .expect(expected)
    .mount(server)
    .await;
}

// ─── List ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_maps_submissions_to_open_summaries() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/submissions"))
    .and(query_param("bsn", BSN))
    .and(header("x-api-key", "secret"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([s123(), s456()])))
    .expect(1)
    .mount(&server)
    .await;

  let summaries = connector(&server).list(&alice()).await.unwrap();

  assert_eq!(summaries.len(), 2);
  let first = &summaries[0];
  assert_eq!(first.identifier, "OF-AB12CD");
  assert_eq!(first.internal_id, "submissions/s123");
  assert_eq!(first.case_type, "Melding openbare ruimte");
  assert_eq!(first.status.as_deref(), Some("Ontvangen"));
  assert_eq!(first.registration_date.to_string(), "2024-01-03");
  assert!(first.is_open());
  assert!(summaries.iter().all(|s| s.end_date.is_none()));
}

#[tokio::test]
async fn list_for_organisation_filters_on_kvk() {
  let server = MockServer::start().await;
  let mut submission = s456();
  submission["bsn"] = Value::Null;
  submission["kvk"] = json!(KVK);
  mount_list(&server, ("kvk", KVK), json!([submission])).await;

  let summaries = connector(&server).list(&acme()).await.unwrap();

  assert_eq!(summaries.len(), 1);
  assert_eq!(summaries[0].identifier, "OF-XY98ZW");
}

#[tokio::test]
async fn list_with_empty_backend_is_empty() {
  let server = MockServer::start().await;
  mount_list(&server, ("bsn", BSN), json!([])).await;

  assert!(connector(&server).list(&alice()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_rejects_malformed_payload() {
  let server = MockServer::start().await;
  let mut broken = s456();
  broken["submittedAt"] = json!("yesterday");
  mount_list(&server, ("bsn", BSN), json!([s123(), broken])).await;

  let err = connector(&server).list(&alice()).await.unwrap_err();
  assert!(matches!(err, Error::Backend { .. }), "{err:?}");
  assert!(err.to_string().contains("submittedAt"), "{err}");
}

#[tokio::test]
async fn list_rejects_submission_of_another_party() {
  let server = MockServer::start().await;
  let mut foreign = s456();
  foreign["bsn"] = json!("111222333");
  mount_list(&server, ("bsn", BSN), json!([s123(), foreign])).await;

  let err = connector(&server).list(&alice()).await.unwrap_err();
  assert!(matches!(err, Error::Backend { .. }), "{err:?}");
}

#[tokio::test]
async fn list_surfaces_backend_failure() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/submissions"))
    .respond_with(ResponseTemplate::new(500))
    .mount(&server)
    .await;

  let err = connector(&server).list(&alice()).await.unwrap_err();
  assert!(matches!(err, Error::Backend { .. }), "{err:?}");
}

// ─── Get ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_lists_generated_document_first_once_formatted() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/submissions/s123"))
    .and(query_param("bsn", BSN))
    .respond_with(ResponseTemplate::new(200).set_body_json(s123()))
    .expect(1)
    .mount(&server)
    .await;

  let record = connector(&server).get("s123", &alice()).await.unwrap().unwrap();

  assert_eq!(record.kind, RecordKind::Submission);
  assert!(record.statuses.is_none());
  assert!(record.tasks.is_empty());
  assert!(record.assignees.is_empty());
  let ids: Vec<_> = record.documents.iter().map(|d| d.id.as_str()).collect();
  assert_eq!(ids, ["a.pdf", "b.pdf", "s123"]);

  let formatted = format_single(&record);
  let ids: Vec<_> =
    formatted.documents.iter().map(|d| d.document.id.as_str()).collect();
  assert_eq!(ids, ["s123", "a.pdf", "b.pdf"]);
  assert_eq!(
    formatted.documents[0].document.file_name.as_deref(),
    Some("OF-AB12CD.pdf")
  );
  assert_eq!(
    formatted.documents[0].registration_date.as_deref(),
    Some("3 januari 2024")
  );
  assert!(formatted.has_documents);
  assert!(!formatted.has_statuses);
}

#[tokio::test]
async fn get_missing_submission_is_none() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/submissions/s999"))
    .respond_with(ResponseTemplate::new(404))
    .mount(&server)
    .await;

  assert!(connector(&server).get("s999", &alice()).await.unwrap().is_none());
}

#[tokio::test]
async fn get_submission_of_another_party_is_none() {
  let server = MockServer::start().await;
  mount_submission(&server, "s123", s123()).await;

  assert!(connector(&server).get("s123", &bob()).await.unwrap().is_none());
}

#[tokio::test]
async fn get_with_unsafe_id_makes_no_request() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_body_json(s123()))
    .expect(0)
    .mount(&server)
    .await;

  let connector = connector(&server);
  for id in ["../s123", "s123/download-url", ""] {
    assert!(connector.get(id, &alice()).await.unwrap().is_none(), "{id:?}");
  }
}

#[tokio::test]
async fn get_rejects_malformed_submission() {
  let server = MockServer::start().await;
  let mut broken = s123();
  broken["attachments"] = json!(["../../etc/passwd"]);
  mount_submission(&server, "s123", broken).await;

  let err = connector(&server).get("s123", &alice()).await.unwrap_err();
  assert!(matches!(err, Error::Backend { .. }), "{err:?}");
}

// ─── Download ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn download_returns_signed_url_for_own_file() {
  let server = MockServer::start().await;
  mount_submission(&server, "s123", s123()).await;
  Mock::given(method("GET"))
    .and(path("/submissions/s123/download-url"))
    .and(query_param("key", "a.pdf"))
    .and(header("x-api-key", "secret"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "url": "https://storage.example/signed/a.pdf?sig=abc",
      "expiresAt": "2024-01-03T10:30:00Z",
    })))
    .expect(1)
    .mount(&server)
    .await;

  let file = connector(&server)
    .download("s123", "a.pdf", &alice())
    .await
    .unwrap()
    .unwrap();

  assert_eq!(file.url, "https://storage.example/signed/a.pdf?sig=abc");
  assert_eq!(file.file_name.as_deref(), Some("a.pdf"));
  assert_eq!(
    file.expires_at.map(|t| t.to_rfc3339()).as_deref(),
    Some("2024-01-03T10:30:00+00:00")
  );
}

#[tokio::test]
async fn download_of_generated_document_uses_reference_as_file_name() {
  let server = MockServer::start().await;
  mount_submission(&server, "s123", s123()).await;
  mount_download_url(&server, "s123", 1).await;

  let file = connector(&server)
    .download("s123", "s123", &alice())
    .await
    .unwrap()
    .unwrap();

  assert_eq!(file.file_name.as_deref(), Some("OF-AB12CD.pdf"));
}

#[tokio::test]
async fn download_of_unknown_file_is_none_without_signing() {
  let server = MockServer::start().await;
  mount_submission(&server, "s123", s123()).await;
  mount_download_url(&server, "s123", 0).await;

  let file = connector(&server).download("s123", "c.pdf", &alice()).await.unwrap();

  assert!(file.is_none());
}

#[tokio::test]
async fn download_requires_ownership() {
  let server = MockServer::start().await;
  mount_submission(&server, "s123", s123()).await;
  mount_download_url(&server, "s123", 0).await;

  let file = connector(&server).download("s123", "a.pdf", &bob()).await.unwrap();

  assert!(file.is_none());
}
