use std::{fs, path::PathBuf};

use reqwest::Client;
use serde_json::{Value, json};
use tempfile::TempDir;

use castlist::{
    api::{
        create_router,
        handlers::{AppState, PagingConfig},
    },
    persist::csv_file::CsvStore,
    runtime::handle::{RuntimeConfig, spawn_store},
};

const SEED: &str = "\
id,first_name,last_name,occupation
3,Monica,Geller,Chef
1,Rachel,Green,Waitress
2,Ross,Geller,Paleontologist
4,Chandler,Bing,
5,Joey,Tribbiani,Actor
6,Phoebe,Buffay,Masseuse
7,Janice,,
";

async fn spawn_app(seed: Option<&str>) -> (String, TempDir, PathBuf) {
    let tmp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = tmp_dir.path().join("friends.csv");
    if let Some(seed) = seed {
        fs::write(&path, seed).expect("seed");
    }

    let store = spawn_store(Box::new(CsvStore::new(&path)), RuntimeConfig::default());
    let app = create_router(AppState {
        store,
        paging: PagingConfig::default(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), tmp_dir, path)
}

fn client() -> Client {
    Client::new()
}

async fn get_json(url: String) -> (u16, Value) {
    let resp = client().get(url).send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn ids(rows: &Value) -> Vec<u64> {
    rows.as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_returns_ok() {
    let (base_url, _tmp, _) = spawn_app(None).await;
    let (status, body) = get_json(format!("{}/health", base_url)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn home_page_is_html() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let resp = client().get(format!("{}/", base_url)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("<table"));
}

#[tokio::test]
async fn list_defaults_to_first_five_in_id_order() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) = get_json(format!("{}/characters", base_url)).await;

    assert_eq!(status, 200);
    assert_eq!(
        body["meta"],
        json!({"page": 1, "per_page": 5, "total_records": 7, "total_pages": 2})
    );
    assert_eq!(ids(&body["data"]), vec![1, 2, 3, 4, 5]);
    assert_eq!(body["data"][3]["occupation"], Value::Null);
    assert_eq!(
        body["data"][0],
        json!({"id": 1, "first_name": "Rachel", "last_name": "Green", "occupation": "Waitress"})
    );
}

#[tokio::test]
async fn list_out_of_range_page_is_empty() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) =
        get_json(format!("{}/characters?page=9&per_page=3", base_url)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["total_pages"], 3);
}

#[tokio::test]
async fn list_rejects_bad_paging_params() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    for query in ["page=abc", "per_page=0", "page=-1"] {
        let (status, body) = get_json(format!("{}/characters?{}", base_url, query)).await;
        assert_eq!(status, 400, "query {query}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn list_on_missing_store_is_no_data() {
    let (base_url, _tmp, _) = spawn_app(None).await;
    let (status, body) = get_json(format!("{}/characters", base_url)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "No data found");
}

#[tokio::test]
async fn search_by_first_last_and_both() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;

    let (status, body) =
        get_json(format!("{}/characters/search?first_name=JO", base_url)).await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), vec![5]);

    let (_, body) = get_json(format!("{}/characters/search?last_name=gel", base_url)).await;
    assert_eq!(ids(&body), vec![2, 3]);

    let (_, body) = get_json(format!(
        "{}/characters/search?first_name=mon&last_name=gel",
        base_url
    ))
    .await;
    assert_eq!(ids(&body), vec![3]);
}

#[tokio::test]
async fn search_without_filters_is_bad_request() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) = get_json(format!("{}/characters/search", base_url)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Please provide first_name or last_name");
}

#[tokio::test]
async fn search_without_hits_is_not_found_message() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) =
        get_json(format!("{}/characters/search?first_name=Gunther", base_url)).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "No matching characters found");
}

#[tokio::test]
async fn update_overwrites_known_fields_only() {
    let (base_url, _tmp, path) = spawn_app(Some(SEED)).await;

    let resp = client()
        .put(format!("{}/characters/4", base_url))
        .json(&json!({"occupation": "Copywriter", "nickname": "X"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Character 4 updated successfully");

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("id,first_name,last_name,occupation\n"));
    assert!(text.contains("\n4,Chandler,Bing,Copywriter\n"));
    assert!(!text.contains("nickname"));
}

#[tokio::test]
async fn update_rejects_empty_body_and_unknown_id() {
    let (base_url, _tmp, path) = spawn_app(Some(SEED)).await;

    let resp = client()
        .put(format!("{}/characters/4", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client()
        .put(format!("{}/characters/4", base_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No update data provided");

    let resp = client()
        .put(format!("{}/characters/99", base_url))
        .json(&json!({"occupation": "Barista"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Character with id 99 not found");

    for body in ["{}", ""] {
        let resp = client()
            .put(format!("{}/characters/99", base_url))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404, "body {body:?}");
        let reply: Value = resp.json().await.unwrap();
        assert_eq!(reply["error"], "Character with id 99 not found");
    }

    let resp = client()
        .put(format!("{}/characters/4", base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Request body must be valid JSON");

    let resp = client()
        .put(format!("{}/characters/abc", base_url))
        .json(&json!({"occupation": "Barista"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert_eq!(fs::read_to_string(&path).unwrap(), SEED);
}

#[tokio::test]
async fn delete_removes_record_then_404s() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;

    let resp = client()
        .delete(format!("{}/characters/2", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Character 2 deleted successfully");

    let (_, body) = get_json(format!("{}/characters?per_page=50", base_url)).await;
    assert_eq!(ids(&body["data"]), vec![1, 3, 4, 5, 6, 7]);
    assert_eq!(body["meta"]["total_records"], 6);

    let resp = client()
        .delete(format!("{}/characters/2", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_store_is_generic_500() {
    let (base_url, _tmp, _) = spawn_app(Some("id,first_name\n1,Rachel\n1,Ross\n")).await;
    let (status, body) = get_json(format!("{}/characters", base_url)).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"error": "Internal Server Error"}));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) = get_json(format!("{}/nope", base_url)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Resource not found");
}

#[tokio::test]
async fn wrong_method_is_json_405() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) = get_json(format!("{}/characters/1", base_url)).await;
    assert_eq!(status, 405);
    assert_eq!(body["error"], "Method not allowed");

    let resp = client()
        .post(format!("{}/characters", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_query_strings_are_json_400() {
    let (base_url, _tmp, _) = spawn_app(Some(SEED)).await;
    let (status, body) = get_json(format!(
        "{}/characters/search?first_name=a&first_name=b",
        base_url
    ))
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, body) = get_json(format!("{}/characters?page=1&page=2", base_url)).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn oversized_update_body_is_json_413() {
    let (base_url, _tmp, path) = spawn_app(Some(SEED)).await;
    let big = "x".repeat(castlist::config::MAX_REQUEST_BODY_BYTES + 1);

    let resp = client()
        .put(format!("{}/characters/4", base_url))
        .json(&json!({ "occupation": big }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 413);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Request body too large");

    assert_eq!(fs::read_to_string(&path).unwrap(), SEED);
}
