use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AppError;
use super::lenient;

/// 文体プロファイル。
///
/// 8 つのトップレベル節はすべて必須で、1 つでも欠ければ生成失敗とする。
/// 節の中の葉は欠けていても空値で埋める。モデルが付け足した未知のキーは
/// `extra` に保持し、仿写プロンプトへそのまま戻す。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub style_summary: String,
    pub language: LanguageSection,
    pub structure: StructureSection,
    pub narrative: NarrativeSection,
    pub emotion: EmotionSection,
    pub thinking: ThinkingSection,
    pub uniqueness: UniquenessSection,
    pub cultural: CulturalSection,
    pub rhythm: RhythmSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSection {
    #[serde(deserialize_with = "lenient::string_list")]
    pub sentence_pattern: Vec<String>,
    pub word_choice: WordChoice,
    #[serde(deserialize_with = "lenient::string_list")]
    pub rhetoric: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordChoice {
    /// "1"〜"5"
    #[serde(deserialize_with = "lenient::string")]
    pub formality_level: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub preferred_words: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub avoided_words: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureSection {
    #[serde(deserialize_with = "lenient::string")]
    pub paragraph_length: String,
    #[serde(deserialize_with = "lenient::string")]
    pub transition_style: String,
    #[serde(deserialize_with = "lenient::string")]
    pub hierarchy_pattern: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeSection {
    #[serde(deserialize_with = "lenient::string")]
    pub perspective: String,
    #[serde(deserialize_with = "lenient::string")]
    pub time_sequence: String,
    #[serde(deserialize_with = "lenient::string")]
    pub narrator_attitude: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionSection {
    /// "1"〜"5"
    #[serde(deserialize_with = "lenient::string")]
    pub intensity: String,
    #[serde(deserialize_with = "lenient::string")]
    pub expression_style: String,
    #[serde(deserialize_with = "lenient::string")]
    pub tone: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinkingSection {
    #[serde(deserialize_with = "lenient::string")]
    pub logic_pattern: String,
    /// "1"〜"5"
    #[serde(deserialize_with = "lenient::string")]
    pub depth: String,
    #[serde(deserialize_with = "lenient::string")]
    pub rhythm: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniquenessSection {
    #[serde(deserialize_with = "lenient::string_list")]
    pub signature_phrases: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub imagery_system: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CulturalSection {
    #[serde(deserialize_with = "lenient::string_list")]
    pub allusions: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub knowledge_domains: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmSection {
    #[serde(deserialize_with = "lenient::string")]
    pub syllable_pattern: String,
    #[serde(deserialize_with = "lenient::string")]
    pub pause_pattern: String,
    #[serde(deserialize_with = "lenient::string")]
    pub tempo: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 必須のトップレベル節
pub const REQUIRED_SECTIONS: [&str; 8] = [
    "language",
    "structure",
    "narrative",
    "emotion",
    "thinking",
    "uniqueness",
    "cultural",
    "rhythm",
];

impl StyleProfile {
    /// 抽出済み JSON から組み立てる。節が欠けている・オブジェクトでない場合は E_EXTRACTION
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let Value::Object(map) = &value else {
            return Err(AppError::extraction("文体プロファイルが JSON オブジェクトではありません"));
        };

        let missing: Vec<&str> = REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|key| !matches!(map.get(*key), Some(Value::Object(_))))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::extraction(format!(
                "文体プロファイルの必須項目が不足しています: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::extraction(format!("文体プロファイルの解析失敗: {e}")))
    }

    /// 仿写プロンプトに埋め込む JSON
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
