use crate::types::{AppConfig, InfraError, InfraResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

/// データベース接続プールを作成
pub async fn create_pool(config: &AppConfig) -> InfraResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .map_err(InfraError::database_connection)
}

/// データベースの初期化（マイグレーション実行）
pub async fn initialize_database(pool: &PgPool) -> InfraResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(InfraError::migration)
}

/// プールの作成とデータベース初期化を一括で行う便利関数
pub async fn setup_database(config: &AppConfig) -> InfraResult<PgPool> {
    let pool = create_pool(config).await?;
    initialize_database(&pool).await?;
    tracing::info!(
        max_connections = config.max_connections,
        "データベースの初期化が完了しました"
    );
    Ok(pool)
}
