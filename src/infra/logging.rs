use tracing_subscriber::EnvFilter;

/// RUST_LOGが未設定のときのフィルター
pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn,tower_http=info";

/// tracingサブスクライバーを初期化する
/// 二重初期化（テストなど）ではエラーを無視する
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
