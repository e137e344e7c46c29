//! End-to-end tests: the registry over HTTP against the real router.

mod common;

use common::{pdf, spawn_server, ALICE_TOKEN, BOB_TOKEN};
use docuhub_core::errors::ErrorKind;
use docuhub_core::files::ObjectKey;
use docuhub_core::identity::OwnerId;
use docuhub_core::intake::{IncomingFile, Intake};
use docuhub_core::registry::{DirectorySink, Freshness, RenameOutcome, UploadStatus};
use docuhub_core::storage::{ObjectStore, WriteMode};
use serde_json::{json, Value};

fn names(entries: &[docuhub_core::files::FileEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

#[tokio::test]
async fn upload_then_rename() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);

    let outcomes = registry
        .upload_files(vec![pdf("report.pdf")], Intake::Store)
        .await
        .unwrap();
    assert!(outcomes[0].result.is_ok());
    assert_eq!(registry.uploads().get("report.pdf"), Some(UploadStatus::Success));

    let files = registry.list_files().await.unwrap();
    assert_eq!(names(&files), ["report.pdf"]);

    let outcome = registry
        .rename_file("report.pdf", "report-final.pdf")
        .await
        .unwrap();
    assert!(matches!(outcome, RenameOutcome::Renamed(_)));

    let files = registry.list_files().await.unwrap();
    assert_eq!(names(&files), ["report-final.pdf"]);
}

#[tokio::test]
async fn duplicate_upload_is_rejected() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);

    let first = registry
        .upload_files(vec![pdf("invoice.pdf")], Intake::Store)
        .await
        .unwrap();
    assert!(first[0].result.is_ok());

    let second = registry
        .upload_files(vec![pdf("invoice.pdf")], Intake::Store)
        .await
        .unwrap();
    let err = second[0].result.as_ref().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Duplicate);

    let files = registry.list_files().await.unwrap();
    assert_eq!(names(&files), ["invoice.pdf"]);
}

#[tokio::test]
async fn new_owner_sees_fresh_empty_listing() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("bob", BOB_TOKEN);
    assert_eq!(registry.snapshot().freshness, Freshness::Pending);

    assert!(registry.list_files().await.unwrap().is_empty());
    let snapshot = registry.snapshot();
    assert_eq!(snapshot.freshness, Freshness::Fresh);
    assert!(snapshot.is_fresh_and_empty());
}

#[tokio::test]
async fn delete_through_action_endpoint() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);
    registry
        .upload_files(vec![pdf("a.pdf"), pdf("b.pdf")], Intake::Store)
        .await
        .unwrap();
    registry.list_files().await.unwrap();

    registry.delete_file("a.pdf").await.unwrap();
    assert!(!registry.snapshot().contains("a.pdf"));

    let err = registry.delete_file("a.pdf").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let files = registry.list_files().await.unwrap();
    assert_eq!(names(&files), ["b.pdf"]);
}

#[tokio::test]
async fn rename_errors_are_classified() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);
    registry
        .upload_files(vec![pdf("a.pdf"), pdf("b.pdf")], Intake::Store)
        .await
        .unwrap();

    let err = registry.rename_file("a.pdf", "b.pdf").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Duplicate);

    let err = registry.rename_file("a.pdf", "a b.pdf").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidKey);

    let err = registry.rename_file("ghost.pdf", "c.pdf").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    assert_eq!(names(&registry.list_files().await.unwrap()), ["a.pdf", "b.pdf"]);
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client.get(server.url("/files")).send().await.unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized: User is not logged in");
    assert_eq!(body["errorKind"], "unauthorized");

    let response = client
        .post(server.url("/actions/delete-file"))
        .bearer_auth("wrong-token")
        .json(&json!({ "name": "a.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["status"], 401);

    let (registry, _rx) = server.registry("alice", "wrong-token");
    let err = registry.list_files().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
}

#[tokio::test]
async fn owners_are_isolated() {
    let server = spawn_server().await;
    let (alice, _rx) = server.registry("alice", ALICE_TOKEN);
    let (bob, _rx2) = server.registry("bob", BOB_TOKEN);

    alice
        .upload_files(vec![pdf("private.pdf")], Intake::Store)
        .await
        .unwrap();
    assert!(bob.list_files().await.unwrap().is_empty());
    let err = bob.resolve_read_url("private.pdf").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn signed_url_serves_object_without_credentials() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);
    registry
        .upload_files(vec![pdf("scan.pdf")], Intake::Store)
        .await
        .unwrap();

    let url = registry.resolve_read_url("scan.pdf").await.unwrap();
    assert!(url.signed_url.starts_with(&server.url("/signed/")));
    let remaining = url.expires_at - chrono::Utc::now();
    assert!(remaining > chrono::Duration::seconds(3500));
    assert!(remaining <= chrono::Duration::seconds(3600));
    assert_eq!(registry.cached_read_url("scan.pdf"), Some(url.clone()));

    let response = reqwest::get(&url.signed_url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(response.bytes().await.unwrap().as_ref(), pdf("scan.pdf").bytes.as_slice());

    let response = reqwest::get(server.url("/signed/not-a-token")).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn download_saves_file_and_sets_headers() {
    let server = spawn_server().await;
    let (registry, mut rx) = server.registry("alice", ALICE_TOKEN);
    registry
        .upload_files(vec![pdf("contract.pdf")], Intake::Store)
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path());
    registry.download_file("contract.pdf", &sink).await.unwrap();
    assert_eq!(
        std::fs::read(dir.path().join("contract.pdf")).unwrap(),
        pdf("contract.pdf").bytes
    );

    let response = reqwest::Client::new()
        .get(server.url("/files/contract.pdf/download"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"contract.pdf\""
    );

    while rx.try_recv().is_ok() {}
    let err = registry.download_file("missing.pdf", &sink).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(rx.try_recv().unwrap().title, "Download failed");
}

#[tokio::test]
async fn download_content_type_follows_extension_table() {
    let server = spawn_server().await;
    let owner = OwnerId::parse("alice").unwrap();
    server
        .state
        .store
        .put(
            &ObjectKey::new(&owner, "notes.pdf").unwrap(),
            b"%PDF-1.7",
            "application/x-unknown",
            WriteMode::RejectExisting,
        )
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .get(server.url("/files/notes.pdf/download"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/pdf");
}

#[tokio::test]
async fn analyze_rejects_documents_without_content() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);

    let empty = IncomingFile {
        bytes: Vec::new(),
        ..pdf("empty.pdf")
    };
    let image = IncomingFile {
        name: "photo.png".to_string(),
        content_type: Some("image/png".to_string()),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    let outcomes = registry
        .upload_files(vec![empty, image, pdf("ok.pdf")], Intake::Analyze)
        .await
        .unwrap();
    assert_eq!(outcomes[0].result.as_ref().unwrap_err().kind, ErrorKind::NoContent);
    assert_eq!(outcomes[1].result.as_ref().unwrap_err().kind, ErrorKind::InvalidInput);
    assert!(outcomes[2].result.is_ok());

    assert_eq!(names(&registry.list_files().await.unwrap()), ["ok.pdf"]);
}

#[tokio::test]
async fn upload_without_file_field_is_bad_request() {
    let server = spawn_server().await;
    let form = reqwest::multipart::Form::new().text("note", "no file here");
    let response = reqwest::Client::new()
        .post(server.url("/upload"))
        .bearer_auth(ALICE_TOKEN)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No file provided");
    assert_eq!(body["errorKind"], "invalidInput");
}

#[tokio::test]
async fn listing_honours_limit_and_offset() {
    let server = spawn_server().await;
    let (registry, _rx) = server.registry("alice", ALICE_TOKEN);
    registry
        .upload_files(
            vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf"), pdf("d.pdf")],
            Intake::Store,
        )
        .await
        .unwrap();

    let response = reqwest::Client::new()
        .get(server.url("/files?limit=2&offset=1"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let listed: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, ["b.pdf", "c.pdf"]);
    assert!(body[0]["sizeBytes"].is_u64());
    assert!(body[0]["lastAccessedAt"].is_string());
}

#[tokio::test]
async fn project_lifecycle() {
    let server = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(server.url("/projects"))
        .bearer_auth(ALICE_TOKEN)
        .json(&json!({
            "name": "Harbour Bridge",
            "client": "City Council",
            "startDate": "2024-03-01",
            "status": "in-progress"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let project: Value = response.json().await.unwrap();
    assert_eq!(project["status"], "in-progress");

    let response = client
        .post(server.url("/projects"))
        .bearer_auth(ALICE_TOKEN)
        .json(&json!({ "name": "Harbour Bridge" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errorKind"], "duplicate");

    let listed: Value = client
        .get(server.url("/projects"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = client
        .delete(server.url("/projects/Harbour%20Bridge"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .delete(server.url("/projects/Harbour%20Bridge"))
        .bearer_auth(ALICE_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn health_needs_no_credentials() {
    let server = spawn_server().await;
    let body: Value = reqwest::get(server.url("/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["uptimeSecs"].is_u64());
}
