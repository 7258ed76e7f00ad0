//! 型定義モジュール
//!
//! アプリケーション全体で使用される共通的な型定義を管理します。
//! - 設定: 環境変数から読み込むアプリケーション設定と設定エラー
//! - インフラエラー: DB接続・クエリ・制約違反
//! - ニュースAPIエラー: 入力値・競合・未検出

pub mod config;
pub mod error;
pub mod infra;

// 便利な再エクスポート
pub use config::{AppConfig, ConfigError, ConfigResult};
pub use error::{NewsError, NewsResult};
pub use infra::{InfraError, InfraResult};
