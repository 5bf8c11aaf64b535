use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AppError;
use super::lenient;

/// 判定の確信度帯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceBand {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C")]
    C,
}

impl ConfidenceBand {
    /// 確率から帯を求める: >0.95 A+, >0.85 A, >0.75 B+, >0.65 B, それ以外 C
    pub fn from_probability(p: f64) -> Self {
        if p > 0.95 {
            Self::APlus
        } else if p > 0.85 {
            Self::A
        } else if p > 0.75 {
            Self::BPlus
        } else if p > 0.65 {
            Self::B
        } else {
            Self::C
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A+" => Some(Self::APlus),
            "A" => Some(Self::A),
            "B+" => Some(Self::BPlus),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub ai_probability: f64,
    pub confidence_band: ConfidenceBand,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrimaryIndicator {
    #[serde(deserialize_with = "lenient::string")]
    pub indicator: String,
    #[serde(deserialize_with = "lenient::number_opt")]
    pub value: Option<f64>,
    #[serde(deserialize_with = "lenient::number_opt")]
    pub baseline: Option<f64>,
    #[serde(deserialize_with = "lenient::string")]
    pub severity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSignature {
    #[serde(deserialize_with = "lenient::string")]
    pub top_candidate: String,
    #[serde(deserialize_with = "lenient::string")]
    pub alternative: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicEvidence {
    pub primary_indicators: Vec<PrimaryIndicator>,
    pub model_signature: ModelSignature,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentAnalysis {
    #[serde(deserialize_with = "lenient::string")]
    pub offset: String,
    #[serde(deserialize_with = "lenient::string")]
    pub content_snippet: String,
    #[serde(deserialize_with = "lenient::number_opt")]
    pub anomaly_score: Option<f64>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_metrics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobustnessReport {
    #[serde(deserialize_with = "lenient::number_opt")]
    pub adversarial_score: Option<f64>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub detected_manipulations: Vec<String>,
}

/// AI 生成判定レポート。
///
/// `verdict.ai_probability` だけは必須で、[0, 1] に収まらなければ E_EXTRACTION。
/// それ以外の欠落・型違いは空値で埋める（表示側で「不明」として扱う）。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub verdict: Verdict,
    pub forensic_evidence: ForensicEvidence,
    pub segment_analysis: Vec<SegmentAnalysis>,
    pub robustness_report: RobustnessReport,
}

impl DetectionReport {
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let Value::Object(map) = value else {
            return Err(AppError::extraction("判定レポートが JSON オブジェクトではありません"));
        };

        let verdict = parse_verdict(map.get("verdict"))?;

        Ok(Self {
            verdict,
            forensic_evidence: section(&map, "forensic_evidence"),
            segment_analysis: section(&map, "segment_analysis"),
            robustness_report: section(&map, "robustness_report"),
        })
    }
}

fn parse_verdict(value: Option<&Value>) -> Result<Verdict, AppError> {
    let verdict = value
        .and_then(Value::as_object)
        .ok_or_else(|| AppError::extraction("判定レポートに verdict がありません"))?;

    let probability = match verdict.get("ai_probability") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::extraction("verdict.ai_probability が数値ではありません"))?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(AppError::extraction(format!(
            "verdict.ai_probability が範囲外です: {probability}"
        )));
    }

    // 帯が欠けている・不正なら確率から導出する
    let band = verdict
        .get("confidence_band")
        .and_then(Value::as_str)
        .and_then(ConfidenceBand::parse)
        .unwrap_or_else(|| ConfidenceBand::from_probability(probability));

    Ok(Verdict {
        ai_probability: probability,
        confidence_band: band,
    })
}

/// 型が合わない節は既定値にする
fn section<T>(map: &Map<String, Value>, key: &str) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    match map.get(key) {
        Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
            log::warn!("判定レポートの {key} を解析できません。既定値を使います: {e}");
            T::default()
        }),
        None => T::default(),
    }
}
