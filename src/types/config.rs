use std::env;
use std::net::SocketAddr;
use thiserror::Error;

/// 設定関連のエラー型
/// 環境変数や設定値の検証など設定に関するエラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 環境変数が見つからない
    #[error("環境変数が見つかりません: {name}")]
    MissingEnvironmentVariable { name: String },

    /// 設定値が不正
    #[error("設定値が不正です: {name} - {reason}")]
    InvalidValue { name: String, reason: String },
}

impl ConfigError {
    /// 環境変数不足エラーを作成
    pub fn missing_env_var<N: Into<String>>(name: N) -> Self {
        Self::MissingEnvironmentVariable { name: name.into() }
    }

    /// 不正な設定値エラーを作成
    pub fn invalid_value<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidValue {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// アプリケーション設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    /// ルーターをネストするパス (例: `/api/v1`)。空文字列ならルート直下
    pub api_prefix: String,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    /// .envの読み込みは呼び出し側 (main) で行う
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::missing_env_var("DATABASE_URL"))?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid_value("BIND_ADDR", e.to_string()))?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_positive_u32("DATABASE_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let api_prefix = normalize_prefix(
            &lookup("API_PREFIX").unwrap_or_else(|| DEFAULT_API_PREFIX.to_string()),
        );

        Ok(Self {
            database_url,
            bind_addr,
            max_connections,
            api_prefix,
        })
    }
}

fn parse_positive_u32(name: &str, raw: &str) -> ConfigResult<u32> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(ConfigError::invalid_value(name, "1以上を指定してください")),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::invalid_value(name, e.to_string())),
    }
}

// 先頭の`/`を補い、末尾の`/`を除く
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
