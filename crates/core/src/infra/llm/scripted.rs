use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CompletionParams, ModelClient, ModelError};

/// 記録された 1 回分の呼び出し
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub params: CompletionParams,
}

/// ScriptedModel: 事前に積んだ応答を順に返すモック実装。
/// 受け取ったプロンプトを記録するので、テストで上流呼び出し回数を検証できる。
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功応答を積む
    pub fn push_text(&self, text: impl Into<String>) -> &Self {
        self.responses.lock().push_back(Ok(text.into()));
        self
    }

    /// エラー応答を積む
    pub fn push_error(&self, err: ModelError) -> &Self {
        self.responses.lock().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        params: CompletionParams,
    ) -> Result<String, ModelError> {
        self.calls.lock().push(RecordedCall {
            prompt: prompt.to_string(),
            system_prompt: system_prompt.map(str::to_string),
            params,
        });
        // 応答が尽きたら接続失敗として扱う
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Transport("scripted responses exhausted".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
