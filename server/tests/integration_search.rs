use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sift_core::EngineConfig;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use tower::ServiceExt;

fn build_tiny_corpus(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("a.txt"), "cat dog cat").unwrap();
    fs::write(dir.join("b.txt"), "dog bird").unwrap();
    fs::write(dir.join("long.txt"), "word ".repeat(100)).unwrap();
    fs::write(dir.join("notes.md"), "not a text document").unwrap();
}

fn app(root: &Path) -> Router {
    build_tiny_corpus(&root.join("corpus"));
    let config = EngineConfig::new(root.join("corpus"), root.join("index"));
    server::build_app(config).unwrap()
}

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let (status, json) = call(app, "POST", "/api/search?query=cat").await;
    assert_eq!(status, StatusCode::OK);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["document"], "a");
    assert_eq!(arr[0]["snippet"], "cat dog cat");
    assert!(arr[0]["score"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn search_with_spell_correction() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let (_, plain) = call(app.clone(), "POST", "/api/search?query=birds").await;
    assert!(plain["results"].as_array().unwrap().is_empty());

    let (status, json) = call(app, "POST", "/api/search?query=birds&use_spellcorrection=true").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["document"], "b");
}

#[tokio::test]
async fn long_documents_get_truncated_snippets() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let (_, json) = call(app, "POST", "/api/search?query=word").await;
    let snippet = json["results"][0]["snippet"].as_str().unwrap();
    assert!(snippet.ends_with("..."));
    assert_eq!(snippet.chars().count(), 203);
}

#[tokio::test]
async fn corpus_listing_and_content() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let (status, json) = call(app.clone(), "GET", "/api/corpus").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["files"], serde_json::json!(["a", "b", "long"]));

    let (status, json) = call(app.clone(), "GET", "/api/corpus/b").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"], "dog bird");

    let (status, json) = call(app, "GET", "/api/corpus/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "File not found");
}

#[tokio::test]
async fn rebuild_picks_up_new_documents() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());
    fs::write(dir.path().join("corpus").join("c.txt"), "parrot").unwrap();

    let (_, before) = call(app.clone(), "POST", "/api/search?query=parrot").await;
    assert!(before["results"].as_array().unwrap().is_empty());

    let (status, json) = call(app.clone(), "POST", "/api/rebuild-index").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Index rebuilt successfully");

    let (_, after) = call(app, "POST", "/api/search?query=parrot").await;
    assert_eq!(after["results"][0]["document"], "c");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_searches_agree() {
    let dir = tempdir().unwrap();
    let app = app(dir.path());

    let queries = (0..8).map(|i| {
        let app = app.clone();
        let uri = if i % 2 == 0 { "/api/search?query=cat" } else { "/api/search?query=birds&use_spellcorrection=true&use_soundex=true" };
        tokio::spawn(async move { call(app, "POST", uri).await })
    });
    for (i, handle) in queries.enumerate() {
        let (status, json) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        let expected = if i % 2 == 0 { "a" } else { "b" };
        assert_eq!(json["results"][0]["document"], expected);
    }
}
