use serde::{Deserialize, Serialize};

/// 保存済み作品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub keywords: String,
    pub original_text: String,
    pub mimic_text: String,
    pub humanized_text: String,
    pub favorite: bool,
    pub style_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 作品の新規登録内容（id と時刻はストレージ側で採番）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWork {
    pub user_id: String,
    pub title: String,
    pub keywords: String,
    pub original_text: String,
    pub mimic_text: String,
    pub humanized_text: String,
    pub style_id: Option<String>,
}

/// 保存済み文体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStyle {
    pub id: String,
    pub user_id: String,
    pub style_name: String,
    /// StyleProfile の JSON
    pub style_data: serde_json::Value,
    pub created_at: String,
}

/// 作品一覧用サマリー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSummary {
    pub id: String,
    pub title: String,
    pub keywords: String,
    pub favorite: bool,
    pub created_at: String,
}

impl From<&Work> for WorkSummary {
    fn from(work: &Work) -> Self {
        Self {
            id: work.id.clone(),
            title: work.title.clone(),
            keywords: work.keywords.clone(),
            favorite: work.favorite,
            created_at: work.created_at.clone(),
        }
    }
}

/// 解錠前後で出し分けた最終本文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedContent {
    pub text: String,
    pub unlocked: bool,
    pub truncated: bool,
    pub total_chars: usize,
}
