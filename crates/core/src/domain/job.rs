use serde::Serialize;

/// ジョブ状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

/// ジョブ種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    SaveWork,
}

/// ジョブメタデータ
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub job_id: String,
    pub wizard_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: String,
    /// 成功時に作られたレコードの id
    pub result_id: Option<String>,
    pub error: Option<String>,
}

impl JobInfo {
    pub fn new(job_id: String, wizard_id: String, kind: JobKind, now: String) -> Self {
        Self {
            job_id,
            wizard_id,
            kind,
            status: JobStatus::Queued,
            created_at: now,
            result_id: None,
            error: None,
        }
    }
}
