use super::model::{escape_like, News, NewsFilter, NewsQuery, NewsUpdate};
use crate::types::{InfraError, InfraResult};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;

/// newsテーブルのカラム一覧（SELECT / RETURNING 共通）
const NEWS_COLUMNS: &str = "id, source_name, category, headline, story, published_at, \
     image_link, source_link, meta_description, meta_keywords";

/// ニュース記事ストアの抽象化トレイト
///
/// PostgreSQL実装とインメモリ実装を統一的に扱うためのインターフェースです。
/// 一意制約違反は `InfraError::IntegrityViolation` として返し、
/// 書き込み失敗時には何も反映しないこと。
#[async_trait]
pub trait NewsStore: Send + Sync {
    /// 記事を1件登録する
    async fn insert(&self, news: &News) -> InfraResult<News>;

    /// 記事をまとめて登録する（全件成功か全件失敗）
    /// 戻り値は入力と同じ順序
    async fn insert_many(&self, items: &[News]) -> InfraResult<Vec<News>>;

    /// IDで記事を取得する
    async fn fetch(&self, id: &str) -> InfraResult<Option<News>>;

    /// 指定されたフィールドのみ更新する。存在しなければNone
    async fn update(&self, id: &str, changes: &NewsUpdate) -> InfraResult<Option<News>>;

    /// 記事を削除する。存在しなければfalse
    async fn delete(&self, id: &str) -> InfraResult<bool>;

    /// 条件に一致する記事のページと総数を同一スナップショットから取得する
    /// 総数はページングと無関係
    async fn page(&self, query: &NewsQuery) -> InfraResult<(Vec<News>, i64)>;

    /// 登録済みのカテゴリ一覧（重複なし・昇順）
    async fn categories(&self) -> InfraResult<Vec<String>>;
}

/// PostgreSQLを使用した本番用ストア実装
#[derive(Debug, Clone)]
pub struct PgNewsStore {
    pool: PgPool,
}

impl PgNewsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// WHERE句を組み立てる（条件がなければ何も追加しない）
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &NewsFilter) {
    let has_cond = filter.headline_contains.is_some()
        || filter.category.is_some()
        || filter.source_name.is_some();
    if !has_cond {
        return;
    }

    qb.push(" WHERE ");
    let mut separated = qb.separated(" AND ");

    if let Some(ref needle) = filter.headline_contains {
        let pattern = format!("%{}%", escape_like(needle));
        separated.push("headline ILIKE ").push_bind_unseparated(pattern);
    }
    if let Some(ref category) = filter.category {
        separated.push("category = ").push_bind_unseparated(category.clone());
    }
    if let Some(ref source_name) = filter.source_name {
        separated
            .push("source_name = ")
            .push_bind_unseparated(source_name.clone());
    }
}

/// 一覧取得用のSELECT文
fn search_query(query: &NewsQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {NEWS_COLUMNS} FROM news"));
    push_filter(&mut qb, &query.filter);

    // カラム名はSortFieldの固定対応表からのみ来る
    qb.push(format!(
        " ORDER BY {} {}, id ASC",
        query.sort.column(),
        query.order.as_sql()
    ));
    qb.push(" OFFSET ").push_bind(query.offset);
    qb.push(" LIMIT ").push_bind(query.limit);
    qb
}

/// 件数取得用のSELECT文
fn count_query(filter: &NewsFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM news");
    push_filter(&mut qb, filter);
    qb
}

#[async_trait]
impl NewsStore for PgNewsStore {
    async fn insert(&self, news: &News) -> InfraResult<News> {
        const OPERATION: &str = "ニュース記事の登録";

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(InfraError::database_connection)?;

        let sql = format!(
            "INSERT INTO news ({NEWS_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {NEWS_COLUMNS}"
        );
        let created = sqlx::query_as::<_, News>(&sql)
            .bind(&news.id)
            .bind(&news.source_name)
            .bind(&news.category)
            .bind(&news.headline)
            .bind(&news.story)
            .bind(news.published_at)
            .bind(&news.image_link)
            .bind(&news.source_link)
            .bind(&news.meta_description)
            .bind(&news.meta_keywords)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        tx.commit()
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        Ok(created)
    }

    async fn insert_many(&self, items: &[News]) -> InfraResult<Vec<News>> {
        const OPERATION: &str = "ニュース記事の一括登録";
        // PostgreSQL制限を考慮した定数
        const MAX_BIND_PARAMS: usize = 65535;
        const FIELDS_PER_ROW: usize = 10;
        const SAFE_CHUNK_SIZE: usize = MAX_BIND_PARAMS / FIELDS_PER_ROW;

        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(InfraError::database_connection)?;
        let mut created: HashMap<String, News> = HashMap::with_capacity(items.len());

        for chunk in items.chunks(SAFE_CHUNK_SIZE.min(1000)) {
            let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO news ({NEWS_COLUMNS}) "));
            qb.push_values(chunk, |mut b, news| {
                b.push_bind(news.id.clone())
                    .push_bind(news.source_name.clone())
                    .push_bind(news.category.clone())
                    .push_bind(news.headline.clone())
                    .push_bind(news.story.clone())
                    .push_bind(news.published_at)
                    .push_bind(news.image_link.clone())
                    .push_bind(news.source_link.clone())
                    .push_bind(news.meta_description.clone())
                    .push_bind(news.meta_keywords.clone());
            });
            qb.push(format!(" RETURNING {NEWS_COLUMNS}"));

            let rows = qb
                .build_query_as::<News>()
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| InfraError::database_query(OPERATION, e))?;
            created.extend(rows.into_iter().map(|n| (n.id.clone(), n)));
        }

        tx.commit()
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        // RETURNINGの順序は保証されないため入力順に並べ直す
        items
            .iter()
            .map(|news| {
                created.remove(&news.id).ok_or_else(|| {
                    InfraError::integrity_violation(OPERATION, format!("missing row: {}", news.id))
                })
            })
            .collect()
    }

    async fn fetch(&self, id: &str) -> InfraResult<Option<News>> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1");
        sqlx::query_as::<_, News>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| InfraError::database_query("ニュース記事の取得", e))
    }

    async fn update(&self, id: &str, changes: &NewsUpdate) -> InfraResult<Option<News>> {
        const OPERATION: &str = "ニュース記事の更新";

        if changes.is_empty() {
            return self.fetch(id).await;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(InfraError::database_connection)?;

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE news SET ");
        {
            let mut separated = qb.separated(", ");
            // 指定されたフィールドのみSET句に含める
            macro_rules! push_set {
                ($field:ident) => {
                    if let Some(value) = changes.$field.as_set() {
                        separated
                            .push(concat!(stringify!($field), " = "))
                            .push_bind_unseparated(value.cloned());
                    }
                };
            }
            push_set!(source_name);
            push_set!(category);
            push_set!(headline);
            push_set!(story);
            push_set!(published_at);
            push_set!(image_link);
            push_set!(source_link);
            push_set!(meta_description);
            push_set!(meta_keywords);
        }
        qb.push(" WHERE id = ").push_bind(id.to_string());
        qb.push(format!(" RETURNING {NEWS_COLUMNS}"));

        let updated = qb
            .build_query_as::<News>()
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        tx.commit()
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        Ok(updated)
    }

    async fn delete(&self, id: &str) -> InfraResult<bool> {
        const OPERATION: &str = "ニュース記事の削除";

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(InfraError::database_connection)?;

        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        tx.commit()
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn page(&self, query: &NewsQuery) -> InfraResult<(Vec<News>, i64)> {
        const OPERATION: &str = "ニュース記事の検索";

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(InfraError::database_connection)?;

        // 2つのSELECTが同じスナップショットを見るようにする
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        let data = search_query(query)
            .build_query_as::<News>()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        let count = count_query(&query.filter)
            .build_query_scalar::<i64>()
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| InfraError::database_query("ニュース記事の件数取得", e))?;

        tx.commit()
            .await
            .map_err(|e| InfraError::database_query(OPERATION, e))?;

        Ok((data, count))
    }

    async fn categories(&self) -> InfraResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM news WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| InfraError::database_query("カテゴリ一覧の取得", e))
    }
}
