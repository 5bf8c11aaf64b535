//! 各段階の処理本体: プロンプト組み立て → モデル呼び出し → 応答解析。
//!
//! 状態は持たない。段階遷移の管理は `domain::wizard` と `AppService` が受け持つ。

use std::sync::Arc;

use crate::domain::detection::DetectionReport;
use crate::domain::error::AppError;
use crate::domain::style::StyleProfile;
use crate::infra::extract::{extract_plain_text, ResponseExtractor};
use crate::infra::llm::{prompts, CompletionParams, ModelClient};

/// 文体分析: 低温度で構造化出力を安定させる
pub const ANALYSIS_PARAMS: CompletionParams = CompletionParams::new(0.3, 4000);
/// AI 判定
pub const DETECTION_PARAMS: CompletionParams = CompletionParams::new(0.3, 4000);
/// 仿写
pub const MIMIC_PARAMS: CompletionParams = CompletionParams::new(0.8, 4000);
/// 人味改写
pub const HUMANIZE_PARAMS: CompletionParams = CompletionParams::new(0.9, 4000);

pub struct PipelineStages {
    model: Arc<dyn ModelClient>,
    extractor: ResponseExtractor,
}

impl PipelineStages {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            extractor: ResponseExtractor::default(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// サンプル本文から文体プロファイルを抽出する
    pub async fn analyze_style(&self, sample_text: &str) -> Result<StyleProfile, AppError> {
        if sample_text.trim().is_empty() {
            return Err(AppError::validation("分析するテキストを入力してください"));
        }

        let prompt = prompts::build_style_analysis_prompt(sample_text);
        let raw = self.model.complete(&prompt, None, ANALYSIS_PARAMS).await?;
        let value = self.extractor.extract_json(&raw).map_err(|e| {
            log::warn!("文体分析の応答から JSON を取り出せません: {e}");
            AppError::from(e)
        })?;
        StyleProfile::from_value(value)
    }

    /// 文体プロファイルとキーワードから仿写本文を生成する
    pub async fn generate_mimic(
        &self,
        profile: &StyleProfile,
        keywords: &str,
    ) -> Result<String, AppError> {
        if keywords.trim().is_empty() {
            return Err(AppError::validation("キーワードを入力してください"));
        }

        let prompt = prompts::build_mimic_prompt(&profile.to_value(), keywords);
        let raw = self.model.complete(&prompt, None, MIMIC_PARAMS).await?;
        non_empty(extract_plain_text(&raw), "仿写")
    }

    /// 仿写本文を人味のある文章に書き直す
    pub async fn humanize(&self, mimic_text: &str) -> Result<String, AppError> {
        if mimic_text.trim().is_empty() {
            return Err(AppError::validation("改写する文章がありません"));
        }

        let prompt = prompts::build_humanize_prompt(mimic_text);
        let raw = self.model.complete(&prompt, None, HUMANIZE_PARAMS).await?;
        non_empty(extract_plain_text(&raw), "人味改写")
    }

    /// AI 生成らしさを判定する
    pub async fn detect_ai(&self, text: &str) -> Result<DetectionReport, AppError> {
        if text.trim().is_empty() {
            return Err(AppError::validation("判定するテキストを入力してください"));
        }

        let prompt = prompts::build_detection_prompt(text);
        let raw = self.model.complete(&prompt, None, DETECTION_PARAMS).await?;
        let value = self.extractor.extract_json(&raw)?;
        DetectionReport::from_value(value)
    }
}

/// 空の応答は呼び出し失敗ではなく内容の失敗として扱う
fn non_empty(text: String, stage: &str) -> Result<String, AppError> {
    if text.is_empty() {
        Err(AppError::empty_content(format!(
            "{stage}の結果が空でした。もう一度お試しください"
        )))
    } else {
        Ok(text)
    }
}
