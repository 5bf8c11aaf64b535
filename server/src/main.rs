use styleable_core::domain::settings::AppSettings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("設定の読み込みに失敗しました: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = app_lib::run(settings).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
