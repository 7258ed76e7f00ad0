pub mod model;
pub mod repository;
pub mod service;

// 公開APIの再エクスポート

// model.rsから
pub use model::{
    ListNewsParams, Message, News, NewsCreate, NewsFilter, NewsList, NewsQuery, NewsUpdate,
    Patch, SortField, SortOrder,
};

// repository.rsから
pub use repository::{NewsStore, PgNewsStore};

// service.rsから
pub use service::NewsService;
