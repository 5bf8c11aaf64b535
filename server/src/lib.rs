mod commands;
pub mod payloads;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use styleable_core::domain::error::AppError;
use styleable_core::domain::settings::AppSettings;
use styleable_core::usecase::app_service::AppService;

pub use commands::USER_ID_HEADER;

/// ルーターを構築する
pub fn create_app(service: Arc<AppService>) -> Router {
    Router::new()
        .route("/api/health", get(commands::health))
        .route("/api/metrics", get(commands::get_metrics))
        .route("/api/wizards", post(commands::start_wizard))
        .route(
            "/api/wizards/{id}",
            get(commands::get_wizard).delete(commands::discard_wizard),
        )
        .route("/api/wizards/{id}/analyze", post(commands::analyze_style))
        .route("/api/wizards/{id}/styles", post(commands::save_style))
        .route("/api/wizards/{id}/styles/select", post(commands::select_style))
        .route("/api/wizards/{id}/generate", post(commands::generate_mimic))
        .route("/api/wizards/{id}/humanize", post(commands::humanize))
        .route("/api/wizards/{id}/back", post(commands::back))
        .route("/api/wizards/{id}/unlock", post(commands::unlock))
        .route("/api/wizards/{id}/content", get(commands::get_content))
        .route("/api/detect", post(commands::detect_ai))
        .route("/api/styles", get(commands::list_styles))
        .route("/api/styles/{id}", axum::routing::delete(commands::delete_style))
        .route("/api/works", get(commands::list_works))
        .route("/api/works/{id}", get(commands::get_work))
        .route("/api/works/{id}/favorite", put(commands::set_favorite))
        .route(
            "/api/works/{id}/favorite/toggle",
            post(commands::toggle_favorite),
        )
        .route("/api/jobs/{id}", get(commands::get_job))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// 放置ウィザードと終了済みジョブを定期的に片付けるタスクを起動する
pub fn spawn_sweeper(service: Arc<AppService>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            service.sweep().await;
        }
    })
}

/// 設定からサービスを組み立てて待ち受けを開始する
pub async fn run(settings: AppSettings) -> Result<(), AppError> {
    let addr = settings.listen_addr.clone();
    let sweep_every = Duration::from_secs(settings.sweep_interval_secs.max(1));
    let service = Arc::new(AppService::from_settings(settings)?);
    tracing::info!(model = service.model_name(), "サービスを初期化しました");
    spawn_sweeper(service.clone(), sweep_every);

    let app = create_app(service);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("{addr} で待ち受けできません: {e}")))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("サーバーが異常終了しました: {e}")))
}
