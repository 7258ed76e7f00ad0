//! ルーターの結合テスト
//!
//! インメモリストアを注入したaxumルーターに対して、
//! `tower::ServiceExt::oneshot` でリクエストを直接送る。

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use newsdesk::{
    app::create_router, domain::news::NewsService, infra::storage::MemoryNewsStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const PREFIX: &str = "/api/v1";

fn app() -> Router {
    let service = NewsService::new(Arc::new(MemoryNewsStore::new()));
    create_router(service, PREFIX)
}

/// リクエストを送り、ステータスとJSONボディを返す
async fn send(app: &Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(format!("{}{}", PREFIX, path));
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("リクエストの組み立てに失敗");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("ルーターの呼び出しに失敗");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("レスポンスボディの読み込みに失敗");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

// 登録系テスト
mod create {
    use super::*;

    #[tokio::test]
    async fn test_create_returns_201_and_full_record() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/news/",
            Some(json!({
                "id": "a1",
                "headline": "X",
                "published_at": "2025-01-02T03:04:05Z"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "a1");
        assert_eq!(body["headline"], "X");
        assert_eq!(body["category"], Value::Null);
        assert_eq!(body["published_at"], "2025-01-02T03:04:05Z");

        let (status, fetched) = send(&app, "GET", "/news/a1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn test_create_validation_and_conflict_are_400() {
        let app = app();

        let (status, body) = send(&app, "POST", "/news", Some(json!({"headline": "X"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "ID must be provided by the client.");

        let long_id = "x".repeat(256);
        let (status, body) = send(&app, "POST", "/news", Some(json!({"id": long_id}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "ID exceeds maximum length of 255 characters.");

        let (status, _) = send(&app, "POST", "/news", Some(json!({"id": "dup"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&app, "POST", "/news", Some(json!({"id": "dup"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "News article with this ID already exists.");
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri(format!("{}/news", PREFIX))
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_create_all_or_nothing() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/news/bulk",
            Some(json!([{"id": "b1"}, {"id": "b2"}, {"id": "b1"}])),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("One or more news articles have duplicate IDs"));

        let (_, list) = send(&app, "GET", "/news", None).await;
        assert_eq!(list["count"], 0);

        let (status, body) = send(
            &app,
            "POST",
            "/news/bulk",
            Some(json!([{"id": "b2", "headline": "two"}, {"id": "b1", "headline": "one"}])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body[0]["id"], "b2");
        assert_eq!(body[1]["id"], "b1");
    }
}

// 一覧取得系テスト
mod list {
    use super::*;

    async fn seeded() -> Router {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/news/bulk",
            Some(json!([
                {"id": "n1", "headline": "Markets rally", "category": "business",
                 "source_name": "reuters", "published_at": "2025-03-03T00:00:00Z"},
                {"id": "n2", "headline": "Football final", "category": "sport",
                 "source_name": "bbc", "published_at": "2025-03-01T00:00:00Z"},
                {"id": "n3", "headline": "Rally downtown", "category": "world",
                 "source_name": "bbc", "published_at": "2025-03-02T00:00:00Z"}
            ])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    #[tokio::test]
    async fn test_list_filters_sort_and_count() {
        let app = seeded().await;

        let (status, body) = send(&app, "GET", "/news?query=rally&order=desc&limit=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], "n1");

        let (_, body) = send(&app, "GET", "/news?source_name=bbc&category=world", None).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], "n3");

        let (_, body) = send(&app, "GET", "/news/?offset=1", None).await;
        assert_eq!(body["count"], 3);
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["n3", "n1"]);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_params() {
        let app = seeded().await;

        let (status, body) = send(&app, "GET", "/news?sort=nope", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Cannot sort by unknown field: nope");

        let (status, _) = send(&app, "GET", "/news?limit=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/news?limit=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_categories() {
        let app = seeded().await;
        let (status, body) = send(&app, "GET", "/categories", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["business", "sport", "world"]));
    }
}

// 取得・更新・削除系テスト
mod item {
    use super::*;

    #[tokio::test]
    async fn test_id_with_slashes() {
        let app = app();
        let id = "world/2025/article-1";
        let (status, _) = send(&app, "POST", "/news", Some(json!({"id": id}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "GET", &format!("/news/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id);

        let (status, _) = send(&app, "DELETE", &format!("/news/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_partial_and_not_found() {
        let app = app();
        send(
            &app,
            "POST",
            "/news",
            Some(json!({"id": "a1", "headline": "X", "story": "本文"})),
        )
        .await;

        let (status, body) = send(
            &app,
            "PUT",
            "/news/a1",
            Some(json!({"headline": "Y", "story": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["headline"], "Y");
        assert_eq!(body["story"], Value::Null);
        assert_eq!(body["category"], Value::Null);

        let (status, body) = send(&app, "PUT", "/news/missing", Some(json!({"headline": "Z"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "News article not found.");
    }

    #[tokio::test]
    async fn test_lifecycle_example() {
        let app = app();

        let (status, _) = send(&app, "POST", "/news", Some(json!({"id": "a1", "headline": "X"}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "GET", "/news?query=X", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["id"], "a1");

        let (status, body) = send(&app, "PUT", "/news/a1", Some(json!({"headline": "Y"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], Value::Null);

        let (status, body) = send(&app, "DELETE", "/news/a1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "News article deleted successfully.");

        let (status, _) = send(&app, "GET", "/news/a1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", "/news/a1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_long_id_in_path_is_400() {
        let app = app();
        let long_id = "x".repeat(256);
        for method in ["GET", "DELETE"] {
            let (status, _) = send(&app, method, &format!("/news/{}", long_id), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        let (status, _) =
            send(&app, "PUT", &format!("/news/{}", long_id), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_article_with_id_bulk_is_reachable() {
        let app = app();
        let (status, _) = send(&app, "POST", "/news", Some(json!({"id": "bulk", "headline": "X"}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, "GET", "/news/bulk", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "bulk");

        let (status, body) = send(&app, "PUT", "/news/bulk", Some(json!({"headline": "Y"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["headline"], "Y");

        let (status, body) = send(&app, "DELETE", "/news/bulk", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "News article deleted successfully.");

        let (status, body) = send(&app, "GET", "/news/bulk", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "News article not found.");

        // 一括登録は引き続きPOSTで受け付ける
        let (status, _) = send(&app, "POST", "/news/bulk", Some(json!([{"id": "b1"}]))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_undecodable_path_returns_json_400() {
        let app = app();
        for method in ["GET", "DELETE"] {
            let (status, body) = send(&app, method, "/news/%FF", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["detail"].is_string(), "JSONのdetailを返すべき: {}", body);
        }
        let (status, body) = send(&app, "PUT", "/news/%FF", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string(), "JSONのdetailを返すべき: {}", body);
    }
}
