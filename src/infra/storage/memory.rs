use crate::domain::news::model::{News, NewsQuery, NewsUpdate, SortField, SortOrder};
use crate::domain::news::repository::NewsStore;
use crate::types::{InfraError, InfraResult};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tokio::sync::RwLock;

/// インメモリのニュース記事ストア
///
/// DBなしでサービスやルーターを動かすための実装。
/// 書き込みロック内で検査と反映を行うため、バッチ登録は全件成功か全件失敗になる。
/// 並び順はPostgreSQLに合わせ、NULLは昇順で末尾・降順で先頭に来る。
#[derive(Debug, Default)]
pub struct MemoryNewsStore {
    articles: RwLock<Vec<News>>,
}

impl MemoryNewsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初期データ付きで作成する
    pub fn with_articles(articles: Vec<News>) -> Self {
        Self {
            articles: RwLock::new(articles),
        }
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }
}

fn duplicate_key(operation: &str, id: &str) -> InfraError {
    InfraError::integrity_violation(
        operation,
        format!("duplicate key value violates unique constraint: id={}", id),
    )
}

fn compare_by(field: SortField, a: &News, b: &News) -> Option<Ordering> {
    fn cmp_opt<T: Ord>(a: &Option<T>, b: &Option<T>) -> Option<Ordering> {
        match (a, b) {
            (Some(x), Some(y)) => Some(x.cmp(y)),
            (None, None) => Some(Ordering::Equal),
            // NULLを含む比較は方向に応じて呼び出し側で扱う
            _ => None,
        }
    }

    match field {
        SortField::Id => Some(a.id.cmp(&b.id)),
        SortField::SourceName => cmp_opt(&a.source_name, &b.source_name),
        SortField::Category => cmp_opt(&a.category, &b.category),
        SortField::Headline => cmp_opt(&a.headline, &b.headline),
        SortField::Story => cmp_opt(&a.story, &b.story),
        SortField::PublishedAt => cmp_opt(&a.published_at, &b.published_at),
        SortField::ImageLink => cmp_opt(&a.image_link, &b.image_link),
        SortField::SourceLink => cmp_opt(&a.source_link, &b.source_link),
        SortField::MetaDescription => cmp_opt(&a.meta_description, &b.meta_description),
        SortField::MetaKeywords => cmp_opt(&a.meta_keywords, &b.meta_keywords),
    }
}

fn is_null(field: SortField, news: &News) -> bool {
    match field {
        SortField::Id => false,
        SortField::SourceName => news.source_name.is_none(),
        SortField::Category => news.category.is_none(),
        SortField::Headline => news.headline.is_none(),
        SortField::Story => news.story.is_none(),
        SortField::PublishedAt => news.published_at.is_none(),
        SortField::ImageLink => news.image_link.is_none(),
        SortField::SourceLink => news.source_link.is_none(),
        SortField::MetaDescription => news.meta_description.is_none(),
        SortField::MetaKeywords => news.meta_keywords.is_none(),
    }
}

/// ORDER BY <field> <order>, id ASC と同じ並び
fn order_news(field: SortField, order: SortOrder, a: &News, b: &News) -> Ordering {
    let primary = match compare_by(field, a, b) {
        Some(ordering) => match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        },
        None => {
            // NULLは「最大値」として扱う (PostgreSQLの既定)
            let a_null = is_null(field, a);
            match (a_null, order) {
                (true, SortOrder::Asc) | (false, SortOrder::Desc) => Ordering::Greater,
                (true, SortOrder::Desc) | (false, SortOrder::Asc) => Ordering::Less,
            }
        }
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn insert(&self, news: &News) -> InfraResult<News> {
        let mut articles = self.articles.write().await;
        if articles.iter().any(|n| n.id == news.id) {
            return Err(duplicate_key("ニュース記事の登録", &news.id));
        }
        articles.push(news.clone());
        Ok(news.clone())
    }

    async fn insert_many(&self, items: &[News]) -> InfraResult<Vec<News>> {
        const OPERATION: &str = "ニュース記事の一括登録";

        let mut articles = self.articles.write().await;
        let mut seen: HashSet<&str> = articles.iter().map(|n| n.id.as_str()).collect();
        for news in items {
            if !seen.insert(news.id.as_str()) {
                return Err(duplicate_key(OPERATION, &news.id));
            }
        }

        articles.extend(items.iter().cloned());
        Ok(items.to_vec())
    }

    async fn fetch(&self, id: &str) -> InfraResult<Option<News>> {
        let articles = self.articles.read().await;
        Ok(articles.iter().find(|n| n.id == id).cloned())
    }

    async fn update(&self, id: &str, changes: &NewsUpdate) -> InfraResult<Option<News>> {
        let mut articles = self.articles.write().await;
        Ok(articles.iter_mut().find(|n| n.id == id).map(|news| {
            changes.apply_to(news);
            news.clone()
        }))
    }

    async fn delete(&self, id: &str) -> InfraResult<bool> {
        let mut articles = self.articles.write().await;
        let before = articles.len();
        articles.retain(|n| n.id != id);
        Ok(articles.len() < before)
    }

    async fn page(&self, query: &NewsQuery) -> InfraResult<(Vec<News>, i64)> {
        // ページと件数を同じ読み取りロック内で求める
        let articles = self.articles.read().await;
        let mut matched: Vec<&News> = articles
            .iter()
            .filter(|n| query.filter.matches(n))
            .collect();
        let count = matched.len() as i64;
        matched.sort_by(|a, b| order_news(query.sort, query.order, a, b));

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        let data = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((data, count))
    }

    async fn categories(&self) -> InfraResult<Vec<String>> {
        let articles = self.articles.read().await;
        let categories: BTreeSet<String> = articles
            .iter()
            .filter_map(|n| n.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }
}
