//! LLM 応答から JSON オブジェクトを取り出す抽出器。
//!
//! モデルがコードフェンスで囲むかどうかは保証されないため、優先度付きの
//! 戦略リストを順に試す:
//! 1. `json` タグ付きフェンス
//! 2. 任意のフェンス
//! 3. 波括弧スパン（最初の `{` から最後の `}`、次に対応の取れた `{...}` 全て）
//!
//! 候補が JSON オブジェクトとして解析できなければ次の候補へ進む。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// 抽出エラー
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no JSON candidate found in model response")]
    NoCandidate,
    #[error("none of {attempts} JSON candidates could be parsed: {last_error}")]
    Unparseable { attempts: usize, last_error: String },
}

/// 抽出戦略: 応答テキストから JSON 候補の部分文字列を優先順に返す
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn candidates<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

static TAGGED_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json\s*([\s\S]*?)\s*```").expect("valid regex"));

static ANY_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```[A-Za-z0-9_+\-]*\s*([\s\S]*?)\s*```").expect("valid regex")
});

/// ```` ```json ... ``` ```` 形式
pub struct TaggedFence;

impl ExtractionStrategy for TaggedFence {
    fn name(&self) -> &'static str {
        "tagged_fence"
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<&'a str> {
        capture_bodies(&TAGGED_FENCE_RE, text)
    }
}

/// 言語タグの有無を問わないフェンス
pub struct AnyFence;

impl ExtractionStrategy for AnyFence {
    fn name(&self) -> &'static str {
        "any_fence"
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<&'a str> {
        capture_bodies(&ANY_FENCE_RE, text)
    }
}

/// フェンスなしで本文に埋め込まれた `{...}`
pub struct BraceSpan;

impl ExtractionStrategy for BraceSpan {
    fn name(&self) -> &'static str {
        "brace_span"
    }

    fn candidates<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let greedy = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => Some(&text[start..=end]),
            _ => None,
        };

        let mut out: Vec<&str> = greedy.into_iter().collect();
        out.extend(
            balanced_spans(text)
                .into_iter()
                .filter(|span| Some(*span) != greedy),
        );
        out
    }
}

fn capture_bodies<'a>(re: &Regex, text: &'a str) -> Vec<&'a str> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|body| !body.trim().is_empty())
        .collect()
}

/// 文字列リテラルを考慮して対応の取れた `{...}` を開始位置順に列挙する。
///
/// 1 回の走査で開き括弧の位置をスタックに積む。閉じない `{` は末尾で捨てる。
/// 括弧の外の `"` は地の文とみなし、文字列扱いしない。
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    ranges.push((start, i));
                }
            }
            _ => {}
        }
    }

    ranges.sort_unstable_by_key(|&(start, _)| start);
    ranges
        .into_iter()
        .map(|(start, end)| &text[start..=end])
        .collect()
}

/// 戦略チェーン本体
pub struct ResponseExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ResponseExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// 最初に JSON オブジェクトとして解析できた候補を返す
    pub fn extract_json(&self, raw_text: &str) -> Result<Value, ExtractionError> {
        let mut attempts = 0usize;
        let mut last_error = String::new();

        for strategy in &self.strategies {
            for candidate in strategy.candidates(raw_text) {
                attempts += 1;
                match serde_json::from_str::<Value>(candidate.trim()) {
                    Ok(value @ Value::Object(_)) => {
                        log::debug!("JSON 抽出成功: strategy={}", strategy.name());
                        return Ok(value);
                    }
                    Ok(_) => {
                        last_error = format!("{}: not a JSON object", strategy.name());
                    }
                    Err(e) => {
                        log::debug!("JSON 解析失敗、次の候補へ: strategy={} err={e}", strategy.name());
                        last_error = format!("{}: {e}", strategy.name());
                    }
                }
            }
        }

        if attempts == 0 {
            Err(ExtractionError::NoCandidate)
        } else {
            Err(ExtractionError::Unparseable {
                attempts,
                last_error,
            })
        }
    }
}

impl Default for ResponseExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(TaggedFence),
            Box::new(AnyFence),
            Box::new(BraceSpan),
        ])
    }
}

/// 既定の戦略チェーンで JSON を抽出する
pub fn extract_json(raw_text: &str) -> Result<Value, ExtractionError> {
    static DEFAULT: Lazy<ResponseExtractor> = Lazy::new(ResponseExtractor::default);
    DEFAULT.extract_json(raw_text)
}

/// 自由文タスク用: 前後の空白を除くだけ。空文字列も成功として返す
pub fn extract_plain_text(raw_text: &str) -> String {
    raw_text.trim().to_string()
}
