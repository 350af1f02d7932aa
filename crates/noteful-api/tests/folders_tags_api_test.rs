//! Router tests for the folder and tag endpoints.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn test_folder_crud() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;

    let id = app.folder(&token, "  Work  ").await;
    let uri = format!("/api/folders/{}", id);

    let res = app.get(&uri, &token).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Work");
    assert!(res.body.get("userId").is_none());

    let res = app.put(&uri, &token, json!({ "name": "Office" })).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "Office");

    assert_eq!(app.delete(&uri, &token).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, &token).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_folders_listed_by_name() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;
    app.folder(&token, "b").await;
    app.folder(&token, "a").await;

    let res = app.get("/api/folders", &token).await;
    let names: Vec<_> = res.body.as_array().unwrap().iter().map(|f| f["name"].clone()).collect();
    assert_eq!(names, vec![json!("a"), json!("b")]);
}

#[tokio::test]
async fn test_duplicate_folder_name_is_bad_request() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (_, bob) = app.user("bob").await;
    app.folder(&alice, "Work").await;

    let res = app.post("/api/folders", &alice, json!({ "name": "Work" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Folder name already exists");

    // Names are per user
    app.folder(&bob, "Work").await;
}

#[tokio::test]
async fn test_folder_requires_name() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;

    let res = app.post("/api/folders", &token, json!({ "name": "   " })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Missing `name` in request body");
}

#[tokio::test]
async fn test_deleting_folder_unfiles_notes() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;
    let folder = app.folder(&token, "Temp").await;
    let note = app
        .note(&token, json!({ "title": "filed", "folderId": folder }))
        .await;

    app.delete(&format!("/api/folders/{}", folder), &token).await;

    let res = app
        .get(&format!("/api/notes/{}", note["id"].as_str().unwrap()), &token)
        .await;
    assert!(res.body["folderId"].is_null());
}

#[tokio::test]
async fn test_foreign_folder_is_not_found() {
    let app = TestApp::new();
    let (_, alice) = app.user("alice").await;
    let (_, bob) = app.user("bob").await;
    let uri = format!("/api/folders/{}", app.folder(&alice, "Private").await);

    assert_eq!(app.get(&uri, &bob).await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.put(&uri, &bob, json!({ "name": "Mine" })).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(app.delete(&uri, &bob).await.status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, &alice).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_tag_crud_and_detach() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;
    let keep = app.tag(&token, "keep").await;
    let drop = app.tag(&token, "drop").await;
    let note = app
        .note(&token, json!({ "title": "x", "tags": [keep, drop] }))
        .await;

    let res = app.post("/api/tags", &token, json!({ "name": "keep" })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Tag name already exists");

    let res = app
        .put(&format!("/api/tags/{}", keep), &token, json!({ "name": "kept" }))
        .await;
    assert_eq!(res.body["name"], "kept");

    let res = app.delete(&format!("/api/tags/{}", drop), &token).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .get(&format!("/api/notes/{}", note["id"].as_str().unwrap()), &token)
        .await;
    assert_eq!(res.body["tags"], json!([{ "id": keep, "name": "kept" }]));

    let res = app.get("/api/tags", &token).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tag_malformed_id() {
    let app = TestApp::new();
    let (_, token) = app.user("alice").await;

    let res = app.get("/api/tags/xyz", &token).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "The `id` is not valid");
}
