use super::model::{
    check_new_id, is_id_too_long, IdViolation, ListNewsParams, Message, News, NewsCreate,
    NewsFilter, NewsList, NewsQuery, NewsUpdate, SortField, SortOrder, DEFAULT_LIMIT,
};
use super::repository::NewsStore;
use crate::types::{InfraError, NewsError, NewsResult};
use std::sync::Arc;

const ID_TOO_LONG: &str = "ID exceeds maximum length of 255 characters.";

/// ニュース記事の操作（入力検証とストアへの委譲）
///
/// ストアはトレイトオブジェクトとして注入するため、
/// テスト時はインメモリ実装に差し替えられる。
#[derive(Clone)]
pub struct NewsService {
    store: Arc<dyn NewsStore>,
}

impl NewsService {
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self { store }
    }

    /// 記事を1件登録する
    ///
    /// 重複IDの判定は事前確認ではなく、書き込み時の一意制約違反で行う。
    pub async fn create(&self, input: NewsCreate) -> NewsResult<News> {
        let id = match check_new_id(input.id.as_deref()) {
            Ok(id) => id.to_string(),
            Err(IdViolation::Missing) => {
                return Err(NewsError::validation("ID must be provided by the client."))
            }
            Err(IdViolation::TooLong) => return Err(NewsError::validation(ID_TOO_LONG)),
        };
        input
            .check_lengths()
            .map_err(|v| NewsError::validation(v.to_string()))?;

        let news = input.into_news(id);
        match self.store.insert(&news).await {
            Ok(created) => {
                tracing::info!(id = %created.id, "ニュース記事を登録しました");
                Ok(created)
            }
            Err(e) if e.is_integrity_violation() => {
                tracing::warn!(id = %news.id, error = %e, "ニュース記事の登録で競合");
                Err(NewsError::conflict("News article with this ID already exists."))
            }
            Err(e) => Err(infra_failure(e)),
        }
    }

    /// 記事をまとめて登録する
    ///
    /// 検証は先頭から順に行い、最初の違反で中断する。
    /// 保存は単一のバッチで行い、衝突があれば1件も保存しない。
    pub async fn bulk_create(&self, inputs: Vec<NewsCreate>) -> NewsResult<Vec<News>> {
        let mut batch = Vec::with_capacity(inputs.len());
        for input in inputs {
            let id = match check_new_id(input.id.as_deref()) {
                Ok(id) => id.to_string(),
                Err(IdViolation::Missing) => {
                    return Err(NewsError::validation(
                        "Each news article must have an ID provided by the client.",
                    ))
                }
                Err(IdViolation::TooLong) => {
                    return Err(NewsError::validation(format!(
                        "ID exceeds maximum length of 255 characters: {}",
                        input.id.as_deref().unwrap_or_default()
                    )))
                }
            };
            input
                .check_lengths()
                .map_err(|v| NewsError::validation(format!("{} (id: {})", v, id)))?;
            batch.push(input.into_news(id));
        }

        if batch.is_empty() {
            return Ok(Vec::new());
        }

        match self.store.insert_many(&batch).await {
            Ok(created) => {
                tracing::info!(count = created.len(), "ニュース記事を一括登録しました");
                Ok(created)
            }
            Err(InfraError::IntegrityViolation { detail, .. }) => {
                tracing::warn!(count = batch.len(), %detail, "ニュース記事の一括登録で競合");
                Err(NewsError::conflict(format!(
                    "One or more news articles have duplicate IDs or invalid data. Error: {}",
                    detail
                )))
            }
            Err(e) => Err(infra_failure(e)),
        }
    }

    /// 条件に一致する記事のページと総数を返す
    pub async fn list(&self, params: ListNewsParams) -> NewsResult<NewsList> {
        let query = build_query(params)?;

        let (data, count) = self.store.page(&query).await.map_err(infra_failure)?;

        Ok(NewsList { data, count })
    }

    /// IDで記事を取得する
    pub async fn get(&self, id: &str) -> NewsResult<News> {
        ensure_id_length(id)?;
        self.store
            .fetch(id)
            .await
            .map_err(infra_failure)?
            .ok_or(NewsError::NotFound)
    }

    /// 指定されたフィールドのみ更新する
    pub async fn update(&self, id: &str, changes: NewsUpdate) -> NewsResult<News> {
        ensure_id_length(id)?;
        changes
            .check_lengths()
            .map_err(|v| NewsError::validation(v.to_string()))?;

        match self.store.update(id, &changes).await {
            Ok(Some(updated)) => {
                tracing::info!(%id, "ニュース記事を更新しました");
                Ok(updated)
            }
            Ok(None) => Err(NewsError::NotFound),
            Err(e) if e.is_integrity_violation() => {
                tracing::warn!(%id, error = %e, "ニュース記事の更新で制約違反");
                Err(NewsError::conflict(
                    "Failed to update news article due to integrity constraints.",
                ))
            }
            Err(e) => Err(infra_failure(e)),
        }
    }

    /// 記事を削除する
    pub async fn delete(&self, id: &str) -> NewsResult<Message> {
        ensure_id_length(id)?;
        if self.store.delete(id).await.map_err(infra_failure)? {
            tracing::info!(%id, "ニュース記事を削除しました");
            Ok(Message::new("News article deleted successfully."))
        } else {
            Err(NewsError::NotFound)
        }
    }

    /// 登録済みのカテゴリ一覧
    pub async fn categories(&self) -> NewsResult<Vec<String>> {
        self.store.categories().await.map_err(infra_failure)
    }
}

/// 生パラメータを検証済みの検索条件に変換する
fn build_query(params: ListNewsParams) -> NewsResult<NewsQuery> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit < 1 {
        return Err(NewsError::validation("limit must be greater than or equal to 1."));
    }
    let offset = params.offset.unwrap_or(0);
    if offset < 0 {
        return Err(NewsError::validation("offset must be greater than or equal to 0."));
    }

    let sort = match params.sort.as_deref() {
        Some(raw) => raw
            .parse::<SortField>()
            .map_err(|e| NewsError::validation(e.to_string()))?,
        None => SortField::default(),
    };
    let order = params
        .order
        .as_deref()
        .map(SortOrder::from_param)
        .unwrap_or_default();

    Ok(NewsQuery {
        filter: NewsFilter::new(params.query, params.category, params.source_name),
        sort,
        order,
        limit,
        offset,
    })
}

fn ensure_id_length(id: &str) -> NewsResult<()> {
    if is_id_too_long(id) {
        Err(NewsError::validation(ID_TOO_LONG))
    } else {
        Ok(())
    }
}

fn infra_failure(e: InfraError) -> NewsError {
    tracing::error!(error = %e, "ストア操作に失敗しました");
    NewsError::Infra(e)
}
