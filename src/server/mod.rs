//! HTTP Server
//!
//! Axumによる変換サービスのHTTP API。
//! 変換はリクエスト内では実行せず、ジョブを投入してIDを返します。

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServiceConfig;
use crate::service::ConversionService;

pub use handlers::{
    ApiError, CleanupResponse, ConvertResponse, HealthResponse, ResultResponse, SheetEntry,
};

/// マルチパートのヘッダー等に許容する追加バイト数
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// HTTPサーバーの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// ハンドラー間で共有する状態
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: ConversionService,
    pub version: String,
}

impl AppState {
    pub fn new(service: ConversionService) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// ルーターを構築する
///
/// リクエストボディの上限はアップロードの最大サイズに合わせて設定されます。
pub fn router(state: AppState) -> Router {
    let body_limit = state.service.config().max_file_size_bytes() as usize + MULTIPART_OVERHEAD_BYTES;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/convert", post(handlers::convert))
        .route("/api/v1/tasks/:task_id/status", get(handlers::task_status))
        .route("/api/v1/tasks/:task_id/result", get(handlers::task_result))
        .route("/api/v1/tasks/:task_id/download", get(handlers::download))
        .route("/api/v1/tasks/:task_id", delete(handlers::cleanup))
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// ロギングを初期化する（`RUST_LOG`が未設定の場合は`excel2md=info,tower_http=info`）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "excel2md=info,tower_http=info".into()),
        )
        .try_init();
}

/// HTTPサーバーを起動する
///
/// Ctrl+CまたはSIGTERMを受け取るとグレースフルに停止します。
pub async fn run_server(config: ServiceConfig, api: ApiConfig) -> anyhow::Result<()> {
    init_tracing();

    let service = ConversionService::new(config)?;
    let app = router(AppState::new(service));

    let addr: SocketAddr = format!("{}:{}", api.host, api.port).parse()?;
    info!("excel2md server starting on http://{}", addr);
    info!("Endpoints: /api/v1/convert, /api/v1/tasks/:task_id/{{status,result,download}}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("excel2md server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, stopping server...");
}
