use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::detection::DetectionReport;
use crate::domain::error::AppError;
use crate::domain::job::{JobInfo, JobKind};
use crate::domain::settings::AppSettings;
use crate::domain::style::StyleProfile;
use crate::domain::types::{GatedContent, NewWork, UserStyle, Work};
use crate::domain::wizard::{Stage, StateTransition, Wizard, WizardRegistry, WizardSnapshot};
use crate::infra::llm::{ChatCompletionClient, ModelClient};
use crate::infra::metrics::{Metrics, MetricsSummary};
use crate::infra::payment::{MockPaymentGateway, PaymentGateway, Receipt};
use crate::infra::storage::{Repository, Storage};
use crate::usecase::job_queue::JobQueue;
use crate::usecase::pipeline::PipelineStages;

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// 実行中の段階の後始末。
///
/// 応答を待つ間に future が破棄されると finish/abort に到達しない。
/// 解除されないまま drop されたら段階を中断扱いにして、再実行できる状態へ戻す。
struct InFlight<'a> {
    wizards: &'a Mutex<WizardRegistry>,
    wizard_id: &'a str,
    stage: Stage,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn new(wizards: &'a Mutex<WizardRegistry>, wizard_id: &'a str, stage: Stage) -> Self {
        Self {
            wizards,
            wizard_id,
            stage,
            armed: true,
        }
    }

    /// 結果の書き戻しは呼び出し側が行う。ロックを取る前に呼ぶこと
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(wizard) = self.wizards.lock().get_mut(self.wizard_id) {
            wizard.abort(self.stage);
            log::warn!(
                "{} が中断されました: wizard={}",
                self.stage.as_str(),
                self.wizard_id
            );
        }
    }
}

/// 段階処理の結果
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub transition: StateTransition,
    pub wizard: WizardSnapshot,
    /// バックグラウンド保存ジョブ（ログイン中の人味改写のみ）
    pub job_id: Option<String>,
}

/// 掃除 1 回分の結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub wizards_expired: usize,
    pub jobs_pruned: usize,
}

/// 解錠の結果
#[derive(Debug, Clone, Serialize)]
pub struct UnlockOutcome {
    pub receipt: Receipt,
    pub content: GatedContent,
}

/// アプリケーションサービス（HTTP ハンドラから共有される）
pub struct AppService {
    wizards: Mutex<WizardRegistry>,
    repo: Arc<dyn Repository>,
    stages: PipelineStages,
    payment: Arc<dyn PaymentGateway>,
    jobs: JobQueue,
    metrics: Arc<Metrics>,
    settings: AppSettings,
}

impl AppService {
    pub fn new(
        repo: Arc<dyn Repository>,
        model: Arc<dyn ModelClient>,
        payment: Arc<dyn PaymentGateway>,
        settings: AppSettings,
    ) -> Self {
        Self {
            wizards: Mutex::new(WizardRegistry::new()),
            repo,
            stages: PipelineStages::new(model),
            payment,
            jobs: JobQueue::new(),
            metrics: Arc::new(Metrics::new()),
            settings,
        }
    }

    /// 設定から本番構成（SQLite + チャット補完 API + 擬似決済）を組み立てる
    pub fn from_settings(settings: AppSettings) -> Result<Self, AppError> {
        let storage = Storage::open(&settings.db_path)?;
        let model = ChatCompletionClient::from_settings(&settings)
            .map_err(|e| AppError::config(format!("LLM クライアント初期化失敗: {e}")))?;
        let payment = MockPaymentGateway::new(Duration::from_millis(settings.payment_delay_ms));

        log::info!(
            "AppService 初期化: db={} model_endpoint={}",
            settings.db_path.display(),
            model.url()
        );

        Ok(Self::new(
            Arc::new(storage),
            Arc::new(model),
            Arc::new(payment),
            settings,
        ))
    }

    pub fn model_name(&self) -> &str {
        self.stages.model_name()
    }

    /// 失敗をメトリクスに記録してそのまま返す
    fn track<T>(&self, op: &str, result: Result<T, AppError>) -> Result<T, AppError> {
        if let Err(e) = &result {
            log::warn!("{op} 失敗: {e}");
            self.metrics.inc_error(e.code);
        }
        result
    }

    fn outcome(
        transition: StateTransition,
        wizard: &Wizard,
        job_id: Option<String>,
    ) -> StageOutcome {
        StageOutcome {
            transition,
            wizard: wizard.snapshot(),
            job_id,
        }
    }

    // ==================== Wizard ====================

    pub fn start_wizard(&self, user_id: Option<String>) -> WizardSnapshot {
        let wizard_id = uuid::Uuid::new_v4().to_string();
        let wizard = Wizard::new(wizard_id.clone(), user_id, now());
        let snapshot = wizard.snapshot();
        self.wizards.lock().insert(wizard);
        log::info!("ウィザード開始: {wizard_id}");
        snapshot
    }

    pub fn get_wizard(&self, wizard_id: &str) -> Result<WizardSnapshot, AppError> {
        self.wizards.lock().get(wizard_id).map(Wizard::snapshot)
    }

    /// 呼び出し元がウィザードを操作できるか確かめる。他人のものは存在しない扱い
    pub fn authorize_wizard(&self, wizard_id: &str, caller: Option<&str>) -> Result<(), AppError> {
        let wizards = self.wizards.lock();
        let wizard = wizards.get(wizard_id)?;
        if wizard.is_accessible_by(caller) {
            Ok(())
        } else {
            log::warn!("他の利用者のウィザードへのアクセスを拒否: wizard={wizard_id}");
            Err(AppError::not_found(format!(
                "ウィザードが見つかりません: {wizard_id}"
            )))
        }
    }

    pub fn discard_wizard(&self, wizard_id: &str) -> Result<(), AppError> {
        self.wizards.lock().remove(wizard_id)?;
        Ok(())
    }

    pub async fn analyze_style(
        &self,
        wizard_id: &str,
        sample_text: &str,
    ) -> Result<StageOutcome, AppError> {
        let result = self.analyze_style_inner(wizard_id, sample_text).await;
        self.track("analyze", result)
    }

    async fn analyze_style_inner(
        &self,
        wizard_id: &str,
        sample_text: &str,
    ) -> Result<StageOutcome, AppError> {
        self.wizards
            .lock()
            .get_mut(wizard_id)?
            .begin_analyze(sample_text)?;
        let in_flight = InFlight::new(&self.wizards, wizard_id, Stage::Analyze);

        let start = Instant::now();
        let result = self.stages.analyze_style(sample_text).await;
        in_flight.disarm();
        self.metrics.record_latency("analyze", elapsed_ms(start));

        let mut wizards = self.wizards.lock();
        let wizard = wizards.get_mut(wizard_id)?;
        match result {
            Ok(profile) => {
                let transition = wizard.finish_analyze(profile, now())?;
                self.metrics.inc_styles_analyzed();
                log::info!("文体分析完了: wizard={wizard_id} {}ms", elapsed_ms(start));
                Ok(Self::outcome(transition, wizard, None))
            }
            Err(e) => {
                wizard.abort(Stage::Analyze);
                Err(e)
            }
        }
    }

    /// 現在の文体プロファイルを名前を付けて保存する
    pub fn save_style(&self, wizard_id: &str, style_name: &str) -> Result<UserStyle, AppError> {
        let result = (|| -> Result<UserStyle, AppError> {
            if style_name.trim().is_empty() {
                return Err(AppError::validation("文体名を入力してください"));
            }
            let (user_id, profile) = {
                let wizards = self.wizards.lock();
                let wizard = wizards.get(wizard_id)?;
                let user_id = wizard
                    .user_id
                    .clone()
                    .ok_or_else(|| AppError::validation("文体の保存にはログインが必要です"))?;
                (user_id, wizard.current_profile()?.to_value())
            };
            self.repo
                .insert_style(&user_id, style_name.trim(), &profile, &now())
        })();
        self.track("save_style", result)
    }

    /// 保存済み文体を選んで文体分析を飛ばす
    pub fn select_style(&self, wizard_id: &str, style_id: &str) -> Result<StageOutcome, AppError> {
        let result = (|| -> Result<StageOutcome, AppError> {
            let user_id = self
                .wizards
                .lock()
                .get(wizard_id)?
                .user_id
                .clone()
                .ok_or_else(|| AppError::validation("保存済み文体の利用にはログインが必要です"))?;

            let style = self
                .repo
                .get_style(&user_id, style_id)?
                .ok_or_else(|| AppError::not_found(format!("文体が見つかりません: {style_id}")))?;
            let profile = StyleProfile::from_value(style.style_data)?;

            let mut wizards = self.wizards.lock();
            let wizard = wizards.get_mut(wizard_id)?;
            let transition = wizard.select_style(style.id, profile, now())?;
            Ok(Self::outcome(transition, wizard, None))
        })();
        self.track("select_style", result)
    }

    pub async fn generate_mimic(
        &self,
        wizard_id: &str,
        keywords: &str,
    ) -> Result<StageOutcome, AppError> {
        let result = self.generate_mimic_inner(wizard_id, keywords).await;
        self.track("generate", result)
    }

    async fn generate_mimic_inner(
        &self,
        wizard_id: &str,
        keywords: &str,
    ) -> Result<StageOutcome, AppError> {
        let profile = self
            .wizards
            .lock()
            .get_mut(wizard_id)?
            .begin_generate(keywords)?;
        let in_flight = InFlight::new(&self.wizards, wizard_id, Stage::Generate);

        let start = Instant::now();
        let result = self.stages.generate_mimic(&profile, keywords).await;
        in_flight.disarm();
        self.metrics.record_latency("generate", elapsed_ms(start));

        let mut wizards = self.wizards.lock();
        let wizard = wizards.get_mut(wizard_id)?;
        match result {
            Ok(text) => {
                let transition = wizard.finish_generate(text, now())?;
                self.metrics.inc_mimics_generated();
                log::info!("仿写完了: wizard={wizard_id} {}ms", elapsed_ms(start));
                Ok(Self::outcome(transition, wizard, None))
            }
            Err(e) => {
                wizard.abort(Stage::Generate);
                Err(e)
            }
        }
    }

    pub async fn humanize(&self, wizard_id: &str) -> Result<StageOutcome, AppError> {
        let result = self.humanize_inner(wizard_id).await;
        self.track("humanize", result)
    }

    async fn humanize_inner(&self, wizard_id: &str) -> Result<StageOutcome, AppError> {
        let mimic_text = self.wizards.lock().get_mut(wizard_id)?.begin_humanize()?;
        let in_flight = InFlight::new(&self.wizards, wizard_id, Stage::Humanize);

        let start = Instant::now();
        let result = self.stages.humanize(&mimic_text).await;
        in_flight.disarm();
        self.metrics.record_latency("humanize", elapsed_ms(start));

        let (transition, snapshot, new_work) = {
            let mut wizards = self.wizards.lock();
            let wizard = wizards.get_mut(wizard_id)?;
            match result {
                Ok(text) => {
                    let (transition, new_work) = wizard.finish_humanize(text, now())?;
                    (transition, wizard.snapshot(), new_work)
                }
                Err(e) => {
                    wizard.abort(Stage::Humanize);
                    return Err(e);
                }
            }
        };
        self.metrics.inc_texts_humanized();
        log::info!("人味改写完了: wizard={wizard_id} {}ms", elapsed_ms(start));

        let job_id = match new_work {
            Some(work) => Some(self.schedule_save_work(wizard_id, work).await),
            None => None,
        };

        Ok(StageOutcome {
            transition,
            wizard: snapshot,
            job_id,
        })
    }

    /// 作品保存をバックグラウンドで 1 回だけ試みる。失敗しても段階は戻さない
    async fn schedule_save_work(&self, wizard_id: &str, work: NewWork) -> String {
        let job_id = self
            .jobs
            .enqueue(wizard_id.to_string(), JobKind::SaveWork)
            .await;

        let repo = self.repo.clone();
        let jobs = self.jobs.clone();
        let metrics = self.metrics.clone();
        let id = job_id.clone();

        let handle = tokio::spawn(async move {
            jobs.mark_running(&id).await;
            match repo.insert_work(&work, &now()) {
                Ok(saved) => {
                    log::info!("作品保存完了: work={} user={}", saved.id, saved.user_id);
                    metrics.inc_works_saved();
                    jobs.mark_done(&id, Some(saved.id)).await;
                }
                Err(e) => {
                    log::warn!("作品保存失敗（処理は継続）: job={id} {e}");
                    metrics.inc_work_save_failures();
                    metrics.inc_error(e.code);
                    jobs.mark_failed(&id, e.to_string()).await;
                }
            }
        });
        self.jobs.set_handle(&job_id, handle).await;

        job_id
    }

    pub fn back(&self, wizard_id: &str) -> Result<StageOutcome, AppError> {
        let result = (|| -> Result<StageOutcome, AppError> {
            let mut wizards = self.wizards.lock();
            let wizard = wizards.get_mut(wizard_id)?;
            let transition = wizard.back(now())?;
            Ok(Self::outcome(transition, wizard, None))
        })();
        self.track("back", result)
    }

    pub async fn unlock(&self, wizard_id: &str) -> Result<UnlockOutcome, AppError> {
        let result = self.unlock_inner(wizard_id).await;
        self.track("unlock", result)
    }

    async fn unlock_inner(&self, wizard_id: &str) -> Result<UnlockOutcome, AppError> {
        let user_id = {
            let mut wizards = self.wizards.lock();
            let wizard = wizards.get_mut(wizard_id)?;
            wizard.begin_unlock()?;
            wizard.user_id.clone()
        };
        let in_flight = InFlight::new(&self.wizards, wizard_id, Stage::Unlock);

        let result = self
            .payment
            .charge(user_id.as_deref(), self.settings.unlock_price_cents)
            .await;
        in_flight.disarm();

        let mut wizards = self.wizards.lock();
        let wizard = wizards.get_mut(wizard_id)?;
        match result {
            Ok(receipt) => {
                wizard.finish_unlock(now())?;
                self.metrics.inc_unlocks();
                let content = wizard.gated_content(self.settings.paywall_preview_chars)?;
                Ok(UnlockOutcome { receipt, content })
            }
            Err(e) => {
                wizard.abort(Stage::Unlock);
                Err(e.into())
            }
        }
    }

    /// 最終本文（未解錠ならプレビューのみ）
    pub fn content(&self, wizard_id: &str) -> Result<GatedContent, AppError> {
        let result = self
            .wizards
            .lock()
            .get(wizard_id)
            .and_then(|w| w.gated_content(self.settings.paywall_preview_chars));
        self.track("content", result)
    }

    // ==================== Detection ====================

    pub async fn detect_ai(&self, text: &str) -> Result<DetectionReport, AppError> {
        let start = Instant::now();
        let result = self.stages.detect_ai(text).await;
        self.metrics.record_latency("detect", elapsed_ms(start));
        if result.is_ok() {
            self.metrics.inc_detections_run();
        }
        self.track("detect", result)
    }

    // ==================== Styles / Works ====================

    fn require_user(user_id: Option<&str>) -> Result<&str, AppError> {
        user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| AppError::validation("ログインが必要です"))
    }

    pub fn list_styles(&self, user_id: Option<&str>) -> Result<Vec<UserStyle>, AppError> {
        let result = Self::require_user(user_id).and_then(|u| self.repo.list_styles(u));
        self.track("list_styles", result)
    }

    pub fn delete_style(&self, user_id: Option<&str>, style_id: &str) -> Result<(), AppError> {
        let result = Self::require_user(user_id).and_then(|u| {
            if self.repo.delete_style(u, style_id)? {
                Ok(())
            } else {
                Err(AppError::not_found(format!("文体が見つかりません: {style_id}")))
            }
        });
        self.track("delete_style", result)
    }

    pub fn list_works(&self, user_id: Option<&str>) -> Result<Vec<Work>, AppError> {
        let result = Self::require_user(user_id).and_then(|u| self.repo.list_works(u));
        self.track("list_works", result)
    }

    pub fn get_work(&self, user_id: Option<&str>, work_id: &str) -> Result<Work, AppError> {
        let result = Self::require_user(user_id).and_then(|u| {
            self.repo
                .get_work(u, work_id)?
                .ok_or_else(|| AppError::not_found(format!("作品が見つかりません: {work_id}")))
        });
        self.track("get_work", result)
    }

    pub fn set_favorite(
        &self,
        user_id: Option<&str>,
        work_id: &str,
        favorite: bool,
    ) -> Result<Work, AppError> {
        let result = Self::require_user(user_id)
            .and_then(|u| self.repo.set_favorite(u, work_id, favorite, &now()));
        self.track("set_favorite", result)
    }

    pub fn toggle_favorite(&self, user_id: Option<&str>, work_id: &str) -> Result<Work, AppError> {
        let result =
            Self::require_user(user_id).and_then(|u| self.repo.toggle_favorite(u, work_id, &now()));
        self.track("toggle_favorite", result)
    }

    // ==================== Jobs / Metrics ====================

    pub async fn get_job(&self, job_id: &str) -> Result<JobInfo, AppError> {
        self.jobs
            .get_job(job_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("ジョブが見つかりません: {job_id}")))
    }

    /// バックグラウンドジョブの終了を待つ
    pub async fn wait_job(&self, job_id: &str) -> Result<JobInfo, AppError> {
        self.jobs
            .wait(job_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("ジョブが見つかりません: {job_id}")))
    }

    pub fn get_metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }

    // ==================== Housekeeping ====================

    /// 放置されたウィザードと保持期間を過ぎたジョブを片付ける
    pub async fn sweep(&self) -> SweepStats {
        self.sweep_at(Utc::now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> SweepStats {
        let idle_secs = u32::try_from(self.settings.wizard_idle_secs).unwrap_or(u32::MAX);
        let max_idle = chrono::Duration::seconds(i64::from(idle_secs));
        let wizards_expired = self.wizards.lock().prune_idle(now, max_idle);
        let jobs_pruned = self
            .jobs
            .prune_finished(Duration::from_secs(self.settings.job_retention_secs))
            .await;

        let stats = SweepStats {
            wizards_expired,
            jobs_pruned,
        };
        if stats != SweepStats::default() {
            log::info!(
                "掃除完了: wizards_expired={wizards_expired} jobs_pruned={jobs_pruned}"
            );
        }
        stats
    }
}
