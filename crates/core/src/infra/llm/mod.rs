pub mod chat;
pub mod prompts;
pub mod scripted;

pub use chat::ChatCompletionClient;
pub use scripted::ScriptedModel;

use async_trait::async_trait;

/// モデル呼び出しエラー
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("API call failed: {status}")]
    Api { status: u16, body: String },
    #[error("Unexpected response shape: {0}")]
    ResponseShape(String),
}

/// 呼び出し箇所ごとに固定される生成パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionParams {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

/// チャット補完エンドポイントとの唯一の接点。
///
/// 1 回の呼び出しにつき上流リクエストはちょうど 1 回。リトライもキャッシュもしない。
/// 同じプロンプトでも結果は変わりうる。
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        params: CompletionParams,
    ) -> Result<String, ModelError>;

    fn name(&self) -> &str;
}
