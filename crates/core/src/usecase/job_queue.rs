use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::job::{JobInfo, JobKind, JobStatus};

/// ジョブキュー: バックグラウンド保存タスクの発行・追跡
#[derive(Clone)]
pub struct JobQueue {
    jobs: Arc<Mutex<HashMap<String, JobEntry>>>,
}

struct JobEntry {
    info: JobInfo,
    handle: Option<JoinHandle<()>>,
    finished_at: Option<Instant>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// ジョブを登録して job_id を返す
    pub async fn enqueue(&self, wizard_id: String, kind: JobKind) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let info = JobInfo::new(job_id.clone(), wizard_id, kind, now);

        let mut jobs = self.jobs.lock().await;
        jobs.insert(
            job_id.clone(),
            JobEntry {
                info,
                handle: None,
                finished_at: None,
            },
        );

        job_id
    }

    /// ジョブのJoinHandleを設定（spawn後に呼ぶ）
    pub async fn set_handle(&self, job_id: &str, handle: JoinHandle<()>) {
        let mut jobs = self.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(job_id) {
            entry.handle = Some(handle);
        }
    }

    /// ジョブをRunning状態に変更
    pub async fn mark_running(&self, job_id: &str) {
        let mut jobs = self.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(job_id) {
            entry.info.status = JobStatus::Running;
        }
    }

    /// ジョブをDone状態に変更
    pub async fn mark_done(&self, job_id: &str, result_id: Option<String>) {
        let mut jobs = self.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(job_id) {
            entry.info.status = JobStatus::Done;
            entry.info.result_id = result_id;
            entry.finished_at = Some(Instant::now());
        }
    }

    /// ジョブをFailed状態に変更
    pub async fn mark_failed(&self, job_id: &str, error: String) {
        let mut jobs = self.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(job_id) {
            entry.info.status = JobStatus::Failed;
            entry.info.error = Some(error);
            entry.finished_at = Some(Instant::now());
        }
    }

    /// ジョブ情報を取得
    pub async fn get_job(&self, job_id: &str) -> Option<JobInfo> {
        let jobs = self.jobs.lock().await;
        jobs.get(job_id).map(|e| e.info.clone())
    }

    /// タスクの終了を待って最終状態を返す
    pub async fn wait(&self, job_id: &str) -> Option<JobInfo> {
        let handle = {
            let mut jobs = self.jobs.lock().await;
            jobs.get_mut(job_id)?.handle.take()
        };
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                log::error!("ジョブタスクが異常終了しました: {job_id}: {e}");
                self.mark_failed(job_id, format!("task join error: {e}")).await;
            }
        }
        self.get_job(job_id).await
    }

    /// 終了から `retention` 以上経ったジョブを削除し、その件数を返す
    pub async fn prune_finished(&self, retention: Duration) -> usize {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, entry| match entry.finished_at {
            Some(finished) => finished.elapsed() < retention,
            None => true,
        });
        before - jobs.len()
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
