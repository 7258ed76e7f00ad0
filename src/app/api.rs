//! ニュース記事のHTTPエンドポイント
//!
//! | 操作 | メソッド + パス | 成功 |
//! |---|---|---|
//! | 登録 | POST /news | 201 + 記事 |
//! | 一括登録 | POST /news/bulk | 201 + 記事一覧 |
//! | 一覧 | GET /news?limit&offset&query&sort&order&category&source_name | 200 + {data, count} |
//! | 取得 | GET /news/{id} | 200 + 記事 |
//! | 更新 | PUT /news/{id} | 200 + 記事 |
//! | 削除 | DELETE /news/{id} | 200 + メッセージ |
//! | カテゴリ一覧 | GET /categories | 200 + 文字列一覧 |
//!
//! IDは `/` を含み得るため、`/news/*id` のワイルドカードで受ける。
//! `/news/bulk` へのGET/PUT/DELETEはID `bulk` の記事に対する操作になる。

use crate::domain::news::{ListNewsParams, Message, News, NewsCreate, NewsList, NewsService, NewsUpdate};
use crate::types::NewsError;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// リクエストボディの上限 (一括登録を考慮して 10 MB)
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// エラーレスポンスのボディ
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for NewsError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            NewsError::Validation { message } | NewsError::Conflict { message } => {
                (StatusCode::BAD_REQUEST, message)
            }
            NewsError::NotFound => (StatusCode::NOT_FOUND, NewsError::NotFound.to_string()),
            // 内部エラーの詳細はログにのみ残す
            NewsError::Infra(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error.".to_string(),
            ),
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

/// ニュース記事のルート定義（状態は未注入）
pub fn news_routes() -> Router<NewsService> {
    Router::new()
        .route("/news", get(list_news).post(create_news))
        .route("/news/", get(list_news).post(create_news))
        // `bulk` というIDの記事も取得・更新・削除できるようにする
        .route(
            "/news/bulk",
            post(bulk_create_news)
                .get(get_bulk_news)
                .put(update_bulk_news)
                .delete(delete_bulk_news),
        )
        .route(
            "/news/*id",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route("/categories", get(list_categories))
}

/// アプリケーション全体のルーターを作成する
///
/// `api_prefix` が空でなければその配下にネストする。
pub fn create_router(service: NewsService, api_prefix: &str) -> Router {
    let routes = news_routes();
    let app = if api_prefix.is_empty() {
        routes
    } else {
        Router::new().nest(api_prefix, routes)
    };

    app.layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

async fn create_news(
    State(service): State<NewsService>,
    payload: Result<Json<NewsCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<News>), NewsError> {
    let Json(input) = payload.map_err(json_rejection)?;
    let created = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn bulk_create_news(
    State(service): State<NewsService>,
    payload: Result<Json<Vec<NewsCreate>>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<News>>), NewsError> {
    let Json(inputs) = payload.map_err(json_rejection)?;
    let created = service.bulk_create(inputs).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_news(
    State(service): State<NewsService>,
    params: Result<Query<ListNewsParams>, QueryRejection>,
) -> Result<Json<NewsList>, NewsError> {
    let Query(params) =
        params.map_err(|rejection| NewsError::validation(rejection.body_text()))?;
    Ok(Json(service.list(params).await?))
}

async fn get_news(
    State(service): State<NewsService>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<News>, NewsError> {
    let Path(id) = id.map_err(path_rejection)?;
    Ok(Json(service.get(&id).await?))
}

async fn update_news(
    State(service): State<NewsService>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<NewsUpdate>, JsonRejection>,
) -> Result<Json<News>, NewsError> {
    let Path(id) = id.map_err(path_rejection)?;
    let Json(changes) = payload.map_err(json_rejection)?;
    Ok(Json(service.update(&id, changes).await?))
}

async fn delete_news(
    State(service): State<NewsService>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<Message>, NewsError> {
    let Path(id) = id.map_err(path_rejection)?;
    Ok(Json(service.delete(&id).await?))
}

// 静的ルート `/news/bulk` に当たったGET/PUT/DELETEはID "bulk" として扱う
const BULK_ID: &str = "bulk";

async fn get_bulk_news(State(service): State<NewsService>) -> Result<Json<News>, NewsError> {
    Ok(Json(service.get(BULK_ID).await?))
}

async fn update_bulk_news(
    State(service): State<NewsService>,
    payload: Result<Json<NewsUpdate>, JsonRejection>,
) -> Result<Json<News>, NewsError> {
    let Json(changes) = payload.map_err(json_rejection)?;
    Ok(Json(service.update(BULK_ID, changes).await?))
}

async fn delete_bulk_news(
    State(service): State<NewsService>,
) -> Result<Json<Message>, NewsError> {
    Ok(Json(service.delete(BULK_ID).await?))
}

async fn list_categories(
    State(service): State<NewsService>,
) -> Result<Json<Vec<String>>, NewsError> {
    Ok(Json(service.categories().await?))
}

fn json_rejection(rejection: JsonRejection) -> NewsError {
    NewsError::validation(rejection.body_text())
}

fn path_rejection(rejection: PathRejection) -> NewsError {
    NewsError::validation(rejection.body_text())
}
