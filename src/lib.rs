//! ニュース記事のCRUD API
//!
//! - `domain::news`: 記事モデル・ストア・サービス
//! - `app`: axumルーターとサーバー
//! - `infra`: DB初期化・ログ・インメモリストア
//! - `types`: 設定とエラー型

pub mod app;
pub mod domain;
pub mod infra;
pub mod types;
