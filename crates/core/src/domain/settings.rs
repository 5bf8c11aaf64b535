use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::error::AppError;

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// HTTP 待ち受けアドレス
    pub listen_addr: String,
    /// SQLite ファイルパス
    pub db_path: PathBuf,
    /// チャット補完 API のベース URL（`/chat/completions` を除く）
    pub llm_api_url: String,
    /// API キー（未設定なら Authorization ヘッダなしで送る）
    #[serde(skip_serializing)]
    pub llm_api_key: Option<String>,
    /// モデル名
    pub llm_model: String,
    /// 上流呼び出しのタイムアウト秒数（None = 無制限）
    pub llm_timeout_secs: Option<u64>,
    /// 未購入時に見せる先頭文字数
    pub paywall_preview_chars: usize,
    /// 解錠価格（セント）
    pub unlock_price_cents: u32,
    /// 擬似決済の待ち時間（ミリ秒）
    pub payment_delay_ms: u64,
    /// 更新が途絶えたウィザードを破棄するまでの秒数
    pub wizard_idle_secs: u64,
    /// 終了したジョブを保持する秒数
    pub job_retention_secs: u64,
    /// 掃除タスクの実行間隔（秒）
    pub sweep_interval_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8787".to_string(),
            db_path: default_db_path(),
            llm_api_url: "https://api.deepseek.com/v1".to_string(),
            llm_api_key: None,
            llm_model: "deepseek-chat".to_string(),
            llm_timeout_secs: None,
            paywall_preview_chars: 300,
            unlock_price_cents: 200,
            payment_delay_ms: 2000,
            wizard_idle_secs: 3600,
            job_retention_secs: 600,
            sweep_interval_secs: 60,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("styleable")
        .join("styleable.db")
}

impl AppSettings {
    /// プロセス環境変数から読み込む
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から読み込む。未設定・空文字は既定値
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Self::default();

        if let Some(v) = get("STYLEABLE_ADDR") {
            settings.listen_addr = v;
        }
        if let Some(v) = get("STYLEABLE_DB_PATH") {
            settings.db_path = PathBuf::from(v);
        }
        if let Some(v) = get("LLM_API_URL") {
            settings.llm_api_url = v;
        }
        settings.llm_api_key = get("LLM_API_KEY");
        if let Some(v) = get("LLM_MODEL") {
            settings.llm_model = v;
        }
        if let Some(v) = get("LLM_TIMEOUT_SECS") {
            settings.llm_timeout_secs = Some(parse_number("LLM_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("PAYWALL_PREVIEW_CHARS") {
            settings.paywall_preview_chars = parse_number("PAYWALL_PREVIEW_CHARS", &v)?;
        }
        if let Some(v) = get("UNLOCK_PRICE_CENTS") {
            settings.unlock_price_cents = parse_number("UNLOCK_PRICE_CENTS", &v)?;
        }
        if let Some(v) = get("PAYMENT_DELAY_MS") {
            settings.payment_delay_ms = parse_number("PAYMENT_DELAY_MS", &v)?;
        }
        if let Some(v) = get("WIZARD_IDLE_SECS") {
            settings.wizard_idle_secs = parse_number("WIZARD_IDLE_SECS", &v)?;
        }
        if let Some(v) = get("JOB_RETENTION_SECS") {
            settings.job_retention_secs = parse_number("JOB_RETENTION_SECS", &v)?;
        }
        if let Some(v) = get("SWEEP_INTERVAL_SECS") {
            settings.sweep_interval_secs = parse_number("SWEEP_INTERVAL_SECS", &v)?;
        }

        Ok(settings)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| AppError::config(format!("{key} の値が不正です ({value}): {e}")))
}
