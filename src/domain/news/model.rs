use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// IDの最大文字数
pub const MAX_ID_LENGTH: usize = 255;
/// source_name / category / headline の最大文字数
pub const MAX_SHORT_TEXT_LENGTH: usize = 255;
/// 一覧取得の既定件数
pub const DEFAULT_LIMIT: i64 = 20;

/// ニュース記事エンティティ（newsテーブルと一致）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct News {
    pub id: String,
    pub source_name: Option<String>,
    pub category: Option<String>,
    pub headline: Option<String>,
    pub story: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_link: Option<String>,
    pub source_link: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

impl News {
    /// IDだけを持つ空の記事
    pub fn with_id<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            source_name: None,
            category: None,
            headline: None,
            story: None,
            published_at: None,
            image_link: None,
            source_link: None,
            meta_description: None,
            meta_keywords: None,
        }
    }
}

/// 記事作成の入力
/// idはクライアントが指定する。欠落は入力値エラーとして扱うためOptionで受ける
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsCreate {
    pub id: Option<String>,
    pub source_name: Option<String>,
    pub category: Option<String>,
    pub headline: Option<String>,
    pub story: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub image_link: Option<String>,
    pub source_link: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
}

impl NewsCreate {
    /// 検証済みのIDで記事エンティティを組み立てる
    pub fn into_news(self, id: String) -> News {
        News {
            id,
            source_name: self.source_name,
            category: self.category,
            headline: self.headline,
            story: self.story,
            published_at: self.published_at,
            image_link: self.image_link,
            source_link: self.source_link,
            meta_description: self.meta_description,
            meta_keywords: self.meta_keywords,
        }
    }

    /// 長さ制限のあるフィールドの検査
    pub fn check_lengths(&self) -> Result<(), LengthViolation> {
        check_short_text("source_name", self.source_name.as_deref())?;
        check_short_text("category", self.category.as_deref())?;
        check_short_text("headline", self.headline.as_deref())
    }
}

/// 部分更新用のフィールドラッパー
///
/// - `Unset`: 入力に含まれていない（変更しない）
/// - `Set(None)`: 明示的にnullが指定された（NULLに更新する）
/// - `Set(Some(v))`: 値が指定された
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Set(Option<T>),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// 指定されている場合のみ値を返す
    pub fn as_set(&self) -> Option<Option<&T>> {
        match self {
            Self::Unset => None,
            Self::Set(value) => Some(value.as_ref()),
        }
    }
}

impl<T: Clone> Patch<T> {
    /// 指定されている場合のみ対象を上書きする
    pub fn apply(&self, target: &mut Option<T>) {
        if let Self::Set(value) = self {
            *target = value.clone();
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        Self::Set(value)
    }
}

// フィールドが存在すれば (nullを含めて) Set になる。欠落時は #[serde(default)] で Unset
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::Set)
    }
}

/// 記事更新の入力。idは変更できない
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewsUpdate {
    pub source_name: Patch<String>,
    pub category: Patch<String>,
    pub headline: Patch<String>,
    pub story: Patch<String>,
    pub published_at: Patch<DateTime<Utc>>,
    pub image_link: Patch<String>,
    pub source_link: Patch<String>,
    pub meta_description: Patch<String>,
    pub meta_keywords: Patch<String>,
}

impl NewsUpdate {
    /// 変更対象のフィールドが一つもないか
    pub fn is_empty(&self) -> bool {
        !(self.source_name.is_set()
            || self.category.is_set()
            || self.headline.is_set()
            || self.story.is_set()
            || self.published_at.is_set()
            || self.image_link.is_set()
            || self.source_link.is_set()
            || self.meta_description.is_set()
            || self.meta_keywords.is_set())
    }

    /// 指定されたフィールドのみを記事に反映する
    pub fn apply_to(&self, news: &mut News) {
        self.source_name.apply(&mut news.source_name);
        self.category.apply(&mut news.category);
        self.headline.apply(&mut news.headline);
        self.story.apply(&mut news.story);
        self.published_at.apply(&mut news.published_at);
        self.image_link.apply(&mut news.image_link);
        self.source_link.apply(&mut news.source_link);
        self.meta_description.apply(&mut news.meta_description);
        self.meta_keywords.apply(&mut news.meta_keywords);
    }

    /// 長さ制限のあるフィールドの検査
    pub fn check_lengths(&self) -> Result<(), LengthViolation> {
        check_short_text("source_name", self.source_name.as_set().flatten().map(String::as_str))?;
        check_short_text("category", self.category.as_set().flatten().map(String::as_str))?;
        check_short_text("headline", self.headline.as_set().flatten().map(String::as_str))
    }
}

/// 一覧取得のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsList {
    pub data: Vec<News>,
    pub count: i64,
}

/// 汎用メッセージレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// IDの検査結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdViolation {
    Missing,
    TooLong,
}

/// 作成時のIDを検査し、有効なIDを返す
pub fn check_new_id(id: Option<&str>) -> Result<&str, IdViolation> {
    match id {
        None | Some("") => Err(IdViolation::Missing),
        Some(id) if is_id_too_long(id) => Err(IdViolation::TooLong),
        Some(id) => Ok(id),
    }
}

/// IDが最大文字数を超えているか（バイト数ではなく文字数）
pub fn is_id_too_long(id: &str) -> bool {
    id.chars().count() > MAX_ID_LENGTH
}

/// 長さ制限違反
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthViolation {
    pub field: &'static str,
}

impl fmt::Display for LengthViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} exceeds maximum length of {} characters.",
            self.field, MAX_SHORT_TEXT_LENGTH
        )
    }
}

fn check_short_text(field: &'static str, value: Option<&str>) -> Result<(), LengthViolation> {
    match value {
        Some(v) if v.chars().count() > MAX_SHORT_TEXT_LENGTH => Err(LengthViolation { field }),
        _ => Ok(()),
    }
}

/// ソート可能なフィールド
/// カラム名は固定の対応表からのみ解決する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    SourceName,
    Category,
    Headline,
    Story,
    #[default]
    PublishedAt,
    ImageLink,
    SourceLink,
    MetaDescription,
    MetaKeywords,
}

impl SortField {
    pub const ALL: [SortField; 10] = [
        SortField::Id,
        SortField::SourceName,
        SortField::Category,
        SortField::Headline,
        SortField::Story,
        SortField::PublishedAt,
        SortField::ImageLink,
        SortField::SourceLink,
        SortField::MetaDescription,
        SortField::MetaKeywords,
    ];

    /// newsテーブルのカラム名
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::SourceName => "source_name",
            SortField::Category => "category",
            SortField::Headline => "headline",
            SortField::Story => "story",
            SortField::PublishedAt => "published_at",
            SortField::ImageLink => "image_link",
            SortField::SourceLink => "source_link",
            SortField::MetaDescription => "meta_description",
            SortField::MetaKeywords => "meta_keywords",
        }
    }
}

/// 未知のソートフィールド
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortField(pub String);

impl fmt::Display for UnknownSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cannot sort by unknown field: {}", self.0)
    }
}

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .iter()
            .find(|field| field.column() == s)
            .copied()
            .ok_or_else(|| UnknownSortField(s.to_string()))
    }
}

/// ソート方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// "desc"（大文字小文字を区別しない）のみ降順、それ以外は昇順
    pub fn from_param(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 一覧取得のフィルター条件（全てAND結合）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsFilter {
    /// headlineの部分一致（大文字小文字を区別しない）
    pub headline_contains: Option<String>,
    pub category: Option<String>,
    pub source_name: Option<String>,
}

impl NewsFilter {
    /// 空文字列は条件なしとして扱う
    pub fn new(
        headline_contains: Option<String>,
        category: Option<String>,
        source_name: Option<String>,
    ) -> Self {
        Self {
            headline_contains: headline_contains.filter(|v| !v.is_empty()),
            category: category.filter(|v| !v.is_empty()),
            source_name: source_name.filter(|v| !v.is_empty()),
        }
    }

    /// 記事が全ての条件を満たすか
    pub fn matches(&self, news: &News) -> bool {
        let headline_ok = match self.headline_contains {
            Some(ref needle) => news
                .headline
                .as_deref()
                .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            None => true,
        };
        let category_ok = match self.category {
            Some(ref c) => news.category.as_deref() == Some(c.as_str()),
            None => true,
        };
        let source_ok = match self.source_name {
            Some(ref s) => news.source_name.as_deref() == Some(s.as_str()),
            None => true,
        };
        headline_ok && category_ok && source_ok
    }
}

/// ストアに渡す検証済みの一覧取得条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub filter: NewsFilter,
    pub sort: SortField,
    pub order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            filter: NewsFilter::default(),
            sort: SortField::default(),
            order: SortOrder::default(),
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// 一覧取得の生パラメータ（クエリ文字列の形そのまま）
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListNewsParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub query: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub category: Option<String>,
    pub source_name: Option<String>,
}

/// LIKEパターン用にワイルドカード文字をエスケープする
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
