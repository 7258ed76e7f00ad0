use anyhow::{Context, Result};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// 指定アドレスでHTTPサーバーを起動し、Ctrl+Cで停止する
pub async fn serve(router: Router, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("アドレスのバインドに失敗しました: {}", addr))?;

    tracing::info!(%addr, "サーバーを起動しました");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTPサーバーが異常終了しました")?;

    tracing::info!("サーバーを停止しました");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "シグナル待機に失敗しました");
        std::future::pending::<()>().await;
    }
}
