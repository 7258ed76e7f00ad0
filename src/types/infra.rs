use sqlx::error::ErrorKind;
use thiserror::Error;

/// インフラストラクチャ層のエラー型
/// データベース接続、クエリ、制約違反など基盤的なエラーを定義
#[derive(Error, Debug)]
pub enum InfraError {
    /// データベース接続エラー
    #[error("データベース接続エラー: {source}")]
    DatabaseConnection {
        #[source]
        source: sqlx::Error,
    },

    /// データベースクエリエラー
    #[error("データベースクエリエラー: {operation} - {source}")]
    DatabaseQuery {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    /// 一意制約などの整合性制約違反
    #[error("整合性制約違反: {operation} - {detail}")]
    IntegrityViolation { operation: String, detail: String },

    /// マイグレーションエラー
    #[error("データベースマイグレーションエラー: {source}")]
    Migration {
        #[source]
        source: sqlx::migrate::MigrateError,
    },
}

impl InfraError {
    /// データベース接続エラーを作成
    pub fn database_connection(source: sqlx::Error) -> Self {
        Self::DatabaseConnection { source }
    }

    /// データベースクエリエラーを作成
    /// 制約違反はIntegrityViolationとして分類する
    pub fn database_query<O: Into<String>>(operation: O, source: sqlx::Error) -> Self {
        let operation = operation.into();
        if let sqlx::Error::Database(ref db_err) = source {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return Self::IntegrityViolation {
                        operation,
                        detail: db_err.message().to_string(),
                    };
                }
                _ => {}
            }
        }
        Self::DatabaseQuery { operation, source }
    }

    /// 整合性制約違反エラーを作成
    pub fn integrity_violation<O: Into<String>, D: Into<String>>(operation: O, detail: D) -> Self {
        Self::IntegrityViolation {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    /// マイグレーションエラーを作成
    pub fn migration(source: sqlx::migrate::MigrateError) -> Self {
        Self::Migration { source }
    }

    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, Self::IntegrityViolation { .. })
    }
}

/// インフラエラーのResult型エイリアス
pub type InfraResult<T> = std::result::Result<T, InfraError>;
