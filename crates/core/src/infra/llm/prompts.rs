//! ステージ別プロンプトテンプレート
//!
//! ユーザー入力はエスケープせずにそのまま埋め込む（プロンプトインジェクション対策はしない）。
//! モデル出力は常に信用しない前提で、応答側は `infra::extract` で防御的に解析する。

/// 文体抽出テンプレート。末尾に分析対象テキストを連結する
pub const STYLE_ANALYSIS_TEMPLATE: &str = r##"# 文章风格提取提示词模板 v1.0
请对末尾给出的文本段落进行深度风格解析，并以结构化格式输出分析结果。
## 分析维度
1. 语言特征（句式、用词、修辞）
2. 结构特征（段落、过渡、层次）
3. 叙事特征（视角、距离、时序）
4. 情感特征（浓淡、方式、基调）
5. 思维特征（逻辑、深度、节奏）
6. 个性标记（独特表达、意象系统）
7. 文化底蕴（典故、知识领域）
8. 韵律节奏（音节、停顿、节奏）
## 输出格式
请以 json 代码块输出，字段如下：
```json
{
"style_summary": "风格一句话概括",
"language": {
"sentence_pattern": ["主要句式特征", "次要句式特征"],
"word_choice": {
"formality_level": "正式度 1-5",
"preferred_words": ["高频特征词1", "特征词2"],
"avoided_words": ["规避词类1", "规避词类2"]
},
"rhetoric": ["主要修辞手法1", "修辞手法2"]
},
"structure": {
"paragraph_length": "段落平均字数",
"transition_style": "过渡特征",
"hierarchy_pattern": "层次展开方式"
},
"narrative": {
"perspective": "叙事视角",
"time_sequence": "时间处理方式",
"narrator_attitude": "叙事态度"
},
"emotion": {
"intensity": "情感强度 1-5",
"expression_style": "表达方式",
"tone": "情感基调"
},
"thinking": {
"logic_pattern": "思维推进方式",
"depth": "思维深度 1-5",
"rhythm": "思维节奏特征"
},
"uniqueness": {
"signature_phrases": ["标志性表达1", "表达2"],
"imagery_system": ["核心意象1", "意象2"]
},
"cultural": {
"allusions": ["典故类型", "使用频率"],
"knowledge_domains": ["涉及领域1", "领域2"]
},
"rhythm": {
"syllable_pattern": "音节特征",
"pause_pattern": "停顿规律",
"tempo": "节奏特征"
}
}
```
## 注意
1. 文中的专有要素（书名、作者姓名、特定地名等）不要提取。
2. 提取目的是基于该风格生成其他主题的文章，提取要素应服务于这一任务。

## 待分析文本
"##;

/// 仿写テンプレート。直前に文体 JSON を置き、`{keywords}` を差し替える
pub const MIMIC_TEMPLATE: &str = r##"# 文章仿写提示词模板 v1.0
基于上述文本风格，为我编写一篇1000字的文章，要求如下：
关键词：{keywords}

注意：
- 禁止使用"让我想起…""这让我想起…""我不由得想起…"等回忆性过渡句
- 避免刻意煽情或直白的情感表达
- 采用自然段落输出，不使用标题和小标题"##;

/// 人味改写テンプレート
pub const HUMANIZE_TEMPLATE: &str = r##"# 人味改写提示词模板 v1.0
基于下列方式改写文本，生成更有"人味"的文章，只输出改写后的正文：
"""
{
"真实人类思维文本范式": {
"核心原则": [
"思维碎片化：思维充满跳跃、联想和中断",
"身体感知优先：身体状态影响思维内容和情绪",
"矛盾并存：内心冲突是常态，不需要解决",
"琐事干扰：日常琐事和随机想法打断深刻思考",
"不完美表达：语言有重复、犹豫和不精确"
],
"文本结构框架": {
"身体层面": {"占比": "20-30%", "要素": ["具体的身体不适感", "具体而微小的细节", "身体需求打断思考"]},
"情绪层面": {"占比": "15-25%", "要素": ["情绪波动无需合理原因", "矛盾情绪并存", "内在自我批评"]},
"思维层面": {"占比": "30-40%", "要素": ["随机联想", "琐事插入", "自我怀疑", "实用担忧"]},
"现实干扰": {"占比": "15-20%", "要素": ["计划失败", "设备故障", "物品损坏", "意外发现"]}
},
"语言技巧": {
"口语化表达": ["加入语气词", "使用不完整句", "自我对话"],
"打破流畅叙事": ["突然转换话题", "中断自己的思路", "用省略号表示思维跳跃"],
"减少华丽修辞": ["避免过度文学化的比喻", "用朴实直接的表达代替优美句子", "保留一些重复和赘述"]
}
}
}
""""##;

/// 人味改写テンプレートと対象テキストの区切り行
pub const HUMANIZE_SEPARATOR: &str = "=== 待改写文本 ===";

/// AI 生成判定テンプレート。`{text}` はちょうど 1 回だけ現れる
pub const DETECTION_TEMPLATE: &str = r##"# AI文本生成概率评估

## 角色定义
作为AI内容法证专家，你整合计算语言学与统计分析方法，对输入文本执行AI生成概率评估。

## 分析矩阵
| 维度     | 检测指标             | 权重 |
|----------|----------------------|------|
| 语言指纹 | 词汇多样性指数       | 0.18 |
|          | 句法树深度变异度     | 0.15 |
| 统计特征 | 条件概率异常值       | 0.22 |
|          | Burstiness           | 0.12 |
| 神经特征 | 注意力分布熵值       | 0.20 |
|          | 嵌入空间离群距离     | 0.13 |

## 置信度校准
ai_probability > 0.95 为 "A+"，> 0.85 为 "A"，> 0.75 为 "B+"，> 0.65 为 "B"，其余为 "C"。

## 输出规范
```json
{
  "verdict": {
    "ai_probability": 0.0,
    "confidence_band": "A+ | A | B+ | B | C"
  },
  "forensic_evidence": {
    "primary_indicators": [
      {"indicator": "Perplexity Delta", "value": 35.2, "baseline": 78.4, "severity": "High"}
    ],
    "model_signature": {"top_candidate": "GPT-4 (p=0.76)", "alternative": "Claude-3 (p=0.63)"}
  },
  "segment_analysis": [
    {"offset": "char[120-180]", "content_snippet": "...", "anomaly_score": 0.88, "key_metrics": ["低词汇熵(2.1)"]}
  ],
  "robustness_report": {
    "adversarial_score": 0,
    "detected_manipulations": ["同义词替换"]
  }
}
```

## 注意事项
严格遵循输出规范，只输出JSON格式数据。

=== 待评估文本开始 ===
{text}
=== 待评估文本结束 ==="##;

/// 文体抽出プロンプト: テンプレート + サンプル本文（そのまま）
pub fn build_style_analysis_prompt(sample_text: &str) -> String {
    let mut prompt = String::with_capacity(STYLE_ANALYSIS_TEMPLATE.len() + sample_text.len());
    prompt.push_str(STYLE_ANALYSIS_TEMPLATE);
    prompt.push_str(sample_text);
    prompt
}

/// 仿写プロンプト: 文体 JSON → 指示ブロック（`{keywords}` 置換済み）
pub fn build_mimic_prompt(style_profile: &serde_json::Value, keywords: &str) -> String {
    format!(
        "{}\n\n{}",
        style_profile,
        MIMIC_TEMPLATE.replacen("{keywords}", keywords, 1)
    )
}

/// 人味改写プロンプト: 指示ブロック → 区切り行 → 対象テキスト
pub fn build_humanize_prompt(mimic_text: &str) -> String {
    format!("{HUMANIZE_TEMPLATE}\n\n{HUMANIZE_SEPARATOR}\n{mimic_text}")
}

/// 判定プロンプト: `{text}` の最初の 1 箇所だけを置換する
pub fn build_detection_prompt(text: &str) -> String {
    DETECTION_TEMPLATE.replacen("{text}", text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_style_prompt_appends_sample_verbatim() {
        let sample = "春风拂过田野，{不转义} \"引号\"";
        let prompt = build_style_analysis_prompt(sample);
        assert!(prompt.starts_with(STYLE_ANALYSIS_TEMPLATE));
        assert!(prompt.ends_with(sample));
    }

    #[test]
    fn test_mimic_prompt_places_profile_first() {
        let profile = json!({"style_summary": "散文"});
        let prompt = build_mimic_prompt(&profile, "古镇木工坊,年轮纹路");
        assert!(prompt.starts_with(r#"{"style_summary":"散文"}"#));
        assert!(prompt.contains("关键词：古镇木工坊,年轮纹路"));
        assert!(!prompt.contains("{keywords}"));
    }

    #[test]
    fn test_humanize_prompt_separator_precedes_text() {
        let prompt = build_humanize_prompt("原文内容");
        let sep = prompt.find(HUMANIZE_SEPARATOR).unwrap();
        let body = prompt.find("原文内容").unwrap();
        assert!(sep < body);
        assert!(prompt.ends_with("原文内容"));
    }

    #[test]
    fn test_detection_template_has_single_placeholder() {
        assert_eq!(DETECTION_TEMPLATE.matches("{text}").count(), 1);
        assert_eq!(MIMIC_TEMPLATE.matches("{keywords}").count(), 1);
    }

    #[test]
    fn test_detection_prompt_replaces_first_only() {
        // 入力に同じトークンが含まれていても再置換しない
        let prompt = build_detection_prompt("a {text} b");
        assert!(prompt.contains("=== 待评估文本开始 ===\na {text} b\n=== 待评估文本结束 ==="));
        assert_eq!(prompt.matches("{text}").count(), 1);
    }
}
