use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::AppError;
use super::style::StyleProfile;
use super::types::{GatedContent, NewWork};

/// タイトルが決まらない場合の既定値
pub const DEFAULT_TITLE: &str = "New Work";

/// ウィザードの段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    AnalyzeStyle,
    EnterTopic,
    GenerateMimic,
    Final,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeStyle => "analyze_style",
            Self::EnterTopic => "enter_topic",
            Self::GenerateMimic => "generate_mimic",
            Self::Final => "final",
        }
    }

    /// 画面上の番号（1〜4）
    pub fn number(&self) -> u8 {
        match self {
            Self::AnalyzeStyle => 1,
            Self::EnterTopic => 2,
            Self::GenerateMimic => 3,
            Self::Final => 4,
        }
    }
}

/// 実行中の処理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analyze,
    Generate,
    Humanize,
    Unlock,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyze => "analyze",
            Self::Generate => "generate",
            Self::Humanize => "humanize",
            Self::Unlock => "unlock",
        }
    }
}

/// ウィザード 1 件分の状態
#[derive(Debug, Clone)]
pub struct Wizard {
    pub wizard_id: String,
    pub user_id: Option<String>,
    pub step: WizardStep,
    pub sample_text: String,
    pub style_profile: Option<StyleProfile>,
    pub style_id: Option<String>,
    pub keywords: String,
    pub title: String,
    pub mimic_text: Option<String>,
    pub humanized_text: Option<String>,
    pub paid: bool,
    in_flight: Option<Stage>,
    pub created_at: String,
    pub updated_at: String,
}

/// 段階遷移の結果
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub wizard_id: String,
    pub prev_step: WizardStep,
    pub new_step: WizardStep,
}

/// API に返すスナップショット（人味改写後の本文は含めない）
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub wizard_id: String,
    pub step: WizardStep,
    pub step_number: u8,
    pub busy: Option<Stage>,
    pub sample_text: String,
    pub style_profile: Option<StyleProfile>,
    pub style_id: Option<String>,
    pub keywords: String,
    pub title: String,
    pub mimic_text: Option<String>,
    pub has_humanized_text: bool,
    pub paid: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// タイトル: 最初のカンマ区切りキーワード（全角カンマも区切りとみなす）
pub fn derive_title(keywords: &str) -> String {
    keywords
        .split([',', '，'])
        .map(str::trim)
        .find(|k| !k.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// 先頭 `preview_chars` 文字だけを返す。切り詰めた場合は "..." を付ける
pub fn preview(text: &str, preview_chars: usize) -> (String, bool) {
    match text.char_indices().nth(preview_chars) {
        Some((idx, _)) => (format!("{}...", &text[..idx]), true),
        None => (text.to_string(), false),
    }
}

impl Wizard {
    pub fn new(wizard_id: String, user_id: Option<String>, now: String) -> Self {
        Self {
            wizard_id,
            user_id,
            step: WizardStep::AnalyzeStyle,
            sample_text: String::new(),
            style_profile: None,
            style_id: None,
            keywords: String::new(),
            title: String::new(),
            mimic_text: None,
            humanized_text: None,
            paid: false,
            in_flight: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn in_flight(&self) -> Option<Stage> {
        self.in_flight
    }

    /// 所有者のいるウィザードは本人だけが触れる。匿名ウィザードは制限なし
    pub fn is_accessible_by(&self, caller: Option<&str>) -> bool {
        match self.user_id.as_deref() {
            Some(owner) => caller == Some(owner),
            None => true,
        }
    }

    /// 最終更新から `max_idle` 以上経過したか。時刻が読めなければ false
    pub fn is_idle(&self, now: DateTime<Utc>, max_idle: chrono::Duration) -> bool {
        DateTime::parse_from_rfc3339(&self.updated_at)
            .map(|updated| now.signed_duration_since(updated) >= max_idle)
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            wizard_id: self.wizard_id.clone(),
            step: self.step,
            step_number: self.step.number(),
            busy: self.in_flight,
            sample_text: self.sample_text.clone(),
            style_profile: self.style_profile.clone(),
            style_id: self.style_id.clone(),
            keywords: self.keywords.clone(),
            title: self.title.clone(),
            mimic_text: self.mimic_text.clone(),
            has_humanized_text: self.humanized_text.is_some(),
            paid: self.paid,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }

    fn ensure_idle(&self) -> Result<(), AppError> {
        match self.in_flight {
            Some(stage) => Err(AppError::invalid_state(format!(
                "{} を処理中です。完了を待ってください",
                stage.as_str()
            ))),
            None => Ok(()),
        }
    }

    fn ensure_step(&self, expected: WizardStep, op: &str) -> Result<(), AppError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(AppError::invalid_state(format!(
                "{op} は {} 段階では実行できません",
                self.step.as_str()
            )))
        }
    }

    fn transition(&mut self, new_step: WizardStep, now: String) -> StateTransition {
        let prev_step = self.step;
        self.step = new_step;
        self.updated_at = now;
        StateTransition {
            wizard_id: self.wizard_id.clone(),
            prev_step,
            new_step,
        }
    }

    /// 処理失敗時: 実行中フラグだけを戻し、段階と入力は保持する
    pub fn abort(&mut self, stage: Stage) {
        if self.in_flight == Some(stage) {
            self.in_flight = None;
        }
    }

    /// AnalyzeStyle 開始: サンプル本文を保存して実行中にする
    pub fn begin_analyze(&mut self, sample_text: &str) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.ensure_step(WizardStep::AnalyzeStyle, "analyze")?;
        if sample_text.trim().is_empty() {
            return Err(AppError::validation("分析するテキストを入力してください"));
        }
        self.sample_text = sample_text.to_string();
        self.in_flight = Some(Stage::Analyze);
        Ok(())
    }

    /// AnalyzeStyle 完了: AnalyzeStyle → EnterTopic
    pub fn finish_analyze(
        &mut self,
        profile: StyleProfile,
        now: String,
    ) -> Result<StateTransition, AppError> {
        self.finish(Stage::Analyze)?;
        self.style_profile = Some(profile);
        self.style_id = None;
        Ok(self.transition(WizardStep::EnterTopic, now))
    }

    /// 保存済み文体を選択: AnalyzeStyle → EnterTopic
    pub fn select_style(
        &mut self,
        style_id: String,
        profile: StyleProfile,
        now: String,
    ) -> Result<StateTransition, AppError> {
        self.ensure_idle()?;
        self.ensure_step(WizardStep::AnalyzeStyle, "select_style")?;
        self.style_profile = Some(profile);
        self.style_id = Some(style_id);
        Ok(self.transition(WizardStep::EnterTopic, now))
    }

    /// 現在の文体プロファイル（保存用）
    pub fn current_profile(&self) -> Result<&StyleProfile, AppError> {
        self.style_profile
            .as_ref()
            .ok_or_else(|| AppError::invalid_state("文体プロファイルがまだありません"))
    }

    /// GenerateMimic 開始: キーワードを保存し、プロンプト用のプロファイルを返す
    pub fn begin_generate(&mut self, keywords: &str) -> Result<StyleProfile, AppError> {
        self.ensure_idle()?;
        self.ensure_step(WizardStep::EnterTopic, "generate")?;
        if keywords.trim().is_empty() {
            return Err(AppError::validation("キーワードを入力してください"));
        }
        let profile = self.current_profile()?.clone();
        self.keywords = keywords.trim().to_string();
        self.in_flight = Some(Stage::Generate);
        Ok(profile)
    }

    /// GenerateMimic 完了: EnterTopic → GenerateMimic
    pub fn finish_generate(
        &mut self,
        mimic_text: String,
        now: String,
    ) -> Result<StateTransition, AppError> {
        self.finish(Stage::Generate)?;
        self.title = derive_title(&self.keywords);
        self.mimic_text = Some(mimic_text);
        Ok(self.transition(WizardStep::GenerateMimic, now))
    }

    /// Humanize 開始: 仿写本文を返す
    pub fn begin_humanize(&mut self) -> Result<String, AppError> {
        self.ensure_idle()?;
        self.ensure_step(WizardStep::GenerateMimic, "humanize")?;
        let mimic = self
            .mimic_text
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::validation("改写する文章がありません"))?;
        self.in_flight = Some(Stage::Humanize);
        Ok(mimic)
    }

    /// Humanize 完了: GenerateMimic → Final。ログイン中なら保存内容を返す
    pub fn finish_humanize(
        &mut self,
        humanized_text: String,
        now: String,
    ) -> Result<(StateTransition, Option<NewWork>), AppError> {
        self.finish(Stage::Humanize)?;
        self.humanized_text = Some(humanized_text.clone());
        self.paid = false;

        let new_work = self.user_id.as_ref().map(|user_id| NewWork {
            user_id: user_id.clone(),
            title: self.title.clone(),
            keywords: self.keywords.clone(),
            original_text: self.sample_text.clone(),
            mimic_text: self.mimic_text.clone().unwrap_or_default(),
            humanized_text,
            style_id: self.style_id.clone(),
        });

        Ok((self.transition(WizardStep::Final, now), new_work))
    }

    /// 解錠開始
    pub fn begin_unlock(&mut self) -> Result<(), AppError> {
        self.ensure_idle()?;
        self.ensure_step(WizardStep::Final, "unlock")?;
        if self.paid {
            return Err(AppError::invalid_state("既に解錠済みです"));
        }
        self.in_flight = Some(Stage::Unlock);
        Ok(())
    }

    /// 解錠完了
    pub fn finish_unlock(&mut self, now: String) -> Result<(), AppError> {
        self.finish(Stage::Unlock)?;
        self.paid = true;
        self.updated_at = now;
        Ok(())
    }

    /// 一段戻る: EnterTopic → AnalyzeStyle, GenerateMimic → EnterTopic
    pub fn back(&mut self, now: String) -> Result<StateTransition, AppError> {
        self.ensure_idle()?;
        match self.step {
            WizardStep::EnterTopic => {
                self.style_profile = None;
                self.style_id = None;
                Ok(self.transition(WizardStep::AnalyzeStyle, now))
            }
            WizardStep::GenerateMimic => {
                self.mimic_text = None;
                self.title.clear();
                Ok(self.transition(WizardStep::EnterTopic, now))
            }
            other => Err(AppError::invalid_state(format!(
                "back は {} 段階では実行できません",
                other.as_str()
            ))),
        }
    }

    /// 最終本文: 未解錠なら先頭 `preview_chars` 文字のみ
    pub fn gated_content(&self, preview_chars: usize) -> Result<GatedContent, AppError> {
        self.ensure_step(WizardStep::Final, "content")?;
        let full = self
            .humanized_text
            .as_deref()
            .ok_or_else(|| AppError::invalid_state("改写済みの本文がありません"))?;
        let total_chars = full.chars().count();

        if self.paid {
            return Ok(GatedContent {
                text: full.to_string(),
                unlocked: true,
                truncated: false,
                total_chars,
            });
        }

        let (text, truncated) = preview(full, preview_chars);
        Ok(GatedContent {
            text,
            unlocked: false,
            truncated,
            total_chars,
        })
    }

    fn finish(&mut self, stage: Stage) -> Result<(), AppError> {
        if self.in_flight != Some(stage) {
            return Err(AppError::internal(format!(
                "{} は開始されていません",
                stage.as_str()
            )));
        }
        self.in_flight = None;
        Ok(())
    }
}

/// ウィザード一覧（複数ユーザー・複数タブを同時に扱う）
#[derive(Default)]
pub struct WizardRegistry {
    wizards: HashMap<String, Wizard>,
}

impl WizardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, wizard: Wizard) {
        self.wizards.insert(wizard.wizard_id.clone(), wizard);
    }

    pub fn get(&self, wizard_id: &str) -> Result<&Wizard, AppError> {
        self.wizards
            .get(wizard_id)
            .ok_or_else(|| AppError::not_found(format!("ウィザードが見つかりません: {wizard_id}")))
    }

    pub fn get_mut(&mut self, wizard_id: &str) -> Result<&mut Wizard, AppError> {
        self.wizards
            .get_mut(wizard_id)
            .ok_or_else(|| AppError::not_found(format!("ウィザードが見つかりません: {wizard_id}")))
    }

    pub fn remove(&mut self, wizard_id: &str) -> Result<Wizard, AppError> {
        self.wizards
            .remove(wizard_id)
            .ok_or_else(|| AppError::not_found(format!("ウィザードが見つかりません: {wizard_id}")))
    }

    /// 放置されたウィザードを取り除き、その件数を返す。処理中のものは残す
    pub fn prune_idle(&mut self, now: DateTime<Utc>, max_idle: chrono::Duration) -> usize {
        let before = self.wizards.len();
        self.wizards
            .retain(|_, w| w.in_flight.is_some() || !w.is_idle(now, max_idle));
        before - self.wizards.len()
    }

    pub fn len(&self) -> usize {
        self.wizards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wizards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::domain::style::fixtures::profile_json;

    fn now() -> String {
        "2025-01-15T10:30:00Z".to_string()
    }

    fn profile() -> StyleProfile {
        StyleProfile::from_value(profile_json()).unwrap()
    }

    fn wizard_at_final(user: Option<&str>) -> Wizard {
        let mut w = Wizard::new("w1".into(), user.map(str::to_string), now());
        w.begin_analyze("样本").unwrap();
        w.finish_analyze(profile(), now()).unwrap();
        w.begin_generate("古镇木工坊,年轮纹路").unwrap();
        w.finish_generate("仿写正文".into(), now()).unwrap();
        w.begin_humanize().unwrap();
        w.finish_humanize("人味正文".into(), now()).unwrap();
        w
    }

    #[test]
    fn test_full_cycle() {
        let mut w = Wizard::new("w1".into(), None, now());
        assert_eq!(w.step, WizardStep::AnalyzeStyle);

        w.begin_analyze("春风").unwrap();
        let t = w.finish_analyze(profile(), now()).unwrap();
        assert_eq!(t.prev_step, WizardStep::AnalyzeStyle);
        assert_eq!(t.new_step, WizardStep::EnterTopic);

        w.begin_generate("古镇木工坊,年轮纹路").unwrap();
        let t = w.finish_generate("正文".into(), now()).unwrap();
        assert_eq!(t.new_step, WizardStep::GenerateMimic);
        assert_eq!(w.title, "古镇木工坊");

        assert_eq!(w.begin_humanize().unwrap(), "正文");
        let (t, new_work) = w.finish_humanize("人味".into(), now()).unwrap();
        assert_eq!(t.new_step, WizardStep::Final);
        assert!(new_work.is_none());
        assert!(!w.paid);
    }

    #[test]
    fn test_empty_sample_is_validation_and_keeps_step() {
        let mut w = Wizard::new("w1".into(), None, now());
        let err = w.begin_analyze("   \n").unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(w.step, WizardStep::AnalyzeStyle);
        assert!(w.in_flight().is_none());
    }

    #[test]
    fn test_abort_preserves_sample() {
        let mut w = Wizard::new("w1".into(), None, now());
        w.begin_analyze("保留这段").unwrap();
        w.abort(Stage::Analyze);
        assert_eq!(w.step, WizardStep::AnalyzeStyle);
        assert_eq!(w.sample_text, "保留这段");
        assert!(w.in_flight().is_none());
        // 再実行できる
        w.begin_analyze("保留这段").unwrap();
    }

    #[test]
    fn test_concurrent_stage_rejected() {
        let mut w = Wizard::new("w1".into(), None, now());
        w.begin_analyze("a").unwrap();
        let err = w.begin_analyze("a").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
        let err = w.back(now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_generate_requires_enter_topic() {
        let mut w = Wizard::new("w1".into(), None, now());
        let err = w.begin_generate("关键词").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut w = Wizard::new("w1".into(), None, now());
        w.begin_analyze("a").unwrap();
        w.finish_analyze(profile(), now()).unwrap();
        let err = w.begin_generate(" ").unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(w.step, WizardStep::EnterTopic);
    }

    #[test]
    fn test_finish_without_begin_is_internal() {
        let mut w = Wizard::new("w1".into(), None, now());
        let err = w.finish_analyze(profile(), now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
    }

    #[test]
    fn test_select_saved_style_skips_analysis() {
        let mut w = Wizard::new("w1".into(), Some("u1".into()), now());
        let t = w.select_style("s1".into(), profile(), now()).unwrap();
        assert_eq!(t.new_step, WizardStep::EnterTopic);
        assert_eq!(w.style_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_back_navigation() {
        let mut w = Wizard::new("w1".into(), None, now());
        assert!(w.back(now()).is_err());

        w.begin_analyze("a").unwrap();
        w.finish_analyze(profile(), now()).unwrap();
        w.begin_generate("k").unwrap();
        w.finish_generate("m".into(), now()).unwrap();

        let t = w.back(now()).unwrap();
        assert_eq!(t.new_step, WizardStep::EnterTopic);
        assert!(w.mimic_text.is_none());
        assert!(w.style_profile.is_some());

        let t = w.back(now()).unwrap();
        assert_eq!(t.new_step, WizardStep::AnalyzeStyle);
        assert!(w.style_profile.is_none());
        assert_eq!(w.sample_text, "a");
    }

    #[test]
    fn test_back_from_final_rejected() {
        let mut w = wizard_at_final(None);
        assert_eq!(w.back(now()).unwrap_err().code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_humanize_builds_work_for_user() {
        let mut w = Wizard::new("w1".into(), Some("u1".into()), now());
        w.begin_analyze("样本").unwrap();
        w.finish_analyze(profile(), now()).unwrap();
        w.begin_generate("古镇木工坊,年轮纹路").unwrap();
        w.finish_generate("仿写".into(), now()).unwrap();
        w.begin_humanize().unwrap();
        let (_, new_work) = w.finish_humanize("人味".into(), now()).unwrap();

        let work = new_work.unwrap();
        assert_eq!(work.user_id, "u1");
        assert_eq!(work.title, "古镇木工坊");
        assert_eq!(work.keywords, "古镇木工坊,年轮纹路");
        assert_eq!(work.original_text, "样本");
        assert_eq!(work.mimic_text, "仿写");
        assert_eq!(work.humanized_text, "人味");
    }

    #[test]
    fn test_unlock_flow() {
        let mut w = wizard_at_final(None);
        w.begin_unlock().unwrap();
        w.finish_unlock(now()).unwrap();
        assert!(w.paid);
        assert_eq!(w.begin_unlock().unwrap_err().code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_unlock_before_final_rejected() {
        let mut w = Wizard::new("w1".into(), None, now());
        assert_eq!(w.begin_unlock().unwrap_err().code, ErrorCode::InvalidState);
    }

    #[test]
    fn test_gated_content() {
        let mut w = wizard_at_final(None);
        w.humanized_text = Some("字".repeat(500));

        let locked = w.gated_content(300).unwrap();
        assert!(!locked.unlocked);
        assert!(locked.truncated);
        assert_eq!(locked.total_chars, 500);
        assert_eq!(locked.text.chars().count(), 303);
        assert!(locked.text.ends_with("..."));

        w.paid = true;
        let full = w.gated_content(300).unwrap();
        assert!(full.unlocked);
        assert_eq!(full.text.chars().count(), 500);
    }

    #[test]
    fn test_short_content_not_truncated() {
        let w = wizard_at_final(None);
        let content = w.gated_content(300).unwrap();
        assert_eq!(content.text, "人味正文");
        assert!(!content.truncated);
    }

    #[test]
    fn test_snapshot_hides_humanized_text() {
        let w = wizard_at_final(None);
        let json = serde_json::to_value(w.snapshot()).unwrap();
        assert_eq!(json["step"], "final");
        assert_eq!(json["step_number"], 4);
        assert_eq!(json["has_humanized_text"], true);
        assert!(json.get("humanized_text").is_none());
        assert!(!json.to_string().contains("人味正文"));
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("古镇木工坊,年轮纹路"), "古镇木工坊");
        assert_eq!(derive_title(" 春天 ，花"), "春天");
        assert_eq!(derive_title(",,"), DEFAULT_TITLE);
        assert_eq!(derive_title(""), DEFAULT_TITLE);
    }

    #[test]
    fn test_preview_counts_chars() {
        assert_eq!(preview("一二三四", 2), ("一二...".to_string(), true));
        assert_eq!(preview("一二", 2), ("一二".to_string(), false));
    }

    #[test]
    fn test_registry() {
        let mut reg = WizardRegistry::new();
        reg.insert(Wizard::new("a".into(), None, now()));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("a").is_ok());
        assert_eq!(reg.get("b").unwrap_err().code, ErrorCode::NotFound);
        reg.remove("a").unwrap();
        assert!(reg.is_empty());
    }

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_owner_access() {
        let owned = Wizard::new("w1".into(), Some("u1".into()), now());
        assert!(owned.is_accessible_by(Some("u1")));
        assert!(!owned.is_accessible_by(Some("u2")));
        assert!(!owned.is_accessible_by(None));

        let anonymous = Wizard::new("w2".into(), None, now());
        assert!(anonymous.is_accessible_by(None));
        assert!(anonymous.is_accessible_by(Some("u1")));
    }

    #[test]
    fn test_prune_idle_skips_busy_and_recent() {
        let mut registry = WizardRegistry::new();
        registry.insert(Wizard::new("old".into(), None, now()));
        let mut busy = Wizard::new("busy".into(), None, now());
        busy.begin_analyze("样本").unwrap();
        registry.insert(busy);
        registry.insert(Wizard::new("fresh".into(), None, "2025-01-15T11:20:00Z".into()));

        // 10:30 から 1 時間後
        let removed = registry.prune_idle(at("2025-01-15T11:30:00Z"), chrono::Duration::hours(1));
        assert_eq!(removed, 1);
        assert!(registry.get("old").is_err());
        assert!(registry.get("busy").is_ok());
        assert!(registry.get("fresh").is_ok());
    }

    #[test]
    fn test_stage_progress_resets_idle_clock() {
        let mut w = Wizard::new("w1".into(), None, now());
        w.begin_analyze("样本").unwrap();
        w.finish_analyze(profile(), "2025-01-15T11:00:00Z".into()).unwrap();
        assert!(!w.is_idle(at("2025-01-15T11:30:00Z"), chrono::Duration::hours(1)));
        assert!(w.is_idle(at("2025-01-15T12:00:00Z"), chrono::Duration::hours(1)));
    }
}
