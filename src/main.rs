use anyhow::{Context, Result};
use newsdesk::{
    app::{create_router, server},
    domain::news::{NewsService, PgNewsStore},
    infra::{db::setup_database, logging::init_tracing},
    types::AppConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // 環境変数を読み込み（.envファイルがあれば使用）
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;
    let pool = setup_database(&config)
        .await
        .context("データベースの準備に失敗しました")?;

    let service = NewsService::new(Arc::new(PgNewsStore::new(pool)));
    let router = create_router(service, &config.api_prefix);

    server::serve(router, config.bind_addr).await
}
