use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::error::ErrorCode;

/// 保持するレイテンシ記録の上限
const LATENCY_CAP: usize = 1000;

/// プロセス内メトリクス収集器
pub struct Metrics {
    counters: Mutex<MetricsCounters>,
    latencies: Mutex<Vec<LatencyRecord>>,
}

#[derive(Debug, Default)]
struct MetricsCounters {
    styles_analyzed: u64,
    mimics_generated: u64,
    texts_humanized: u64,
    detections_run: u64,
    works_saved: u64,
    work_save_failures: u64,
    unlocks: u64,
    errors_validation: u64,
    errors_upstream: u64,
    errors_extraction: u64,
    errors_state: u64,
    errors_storage: u64,
    errors_payment: u64,
    errors_internal: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatencyRecord {
    pub phase: String,
    pub duration_ms: u64,
    pub timestamp: String,
}

/// メトリクスサマリー（API に返す用）
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub styles_analyzed: u64,
    pub mimics_generated: u64,
    pub texts_humanized: u64,
    pub detections_run: u64,
    pub works_saved: u64,
    pub work_save_failures: u64,
    pub unlocks: u64,
    pub error_counts: ErrorCounts,
    pub avg_latency_ms: AvgLatency,
    pub recent_latencies: Vec<LatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorCounts {
    pub validation: u64,
    /// 通信・上流 API・応答形式
    pub upstream: u64,
    /// JSON 抽出・空応答
    pub extraction: u64,
    /// 段階違い・未検出
    pub state: u64,
    pub storage: u64,
    pub payment: u64,
    pub internal: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvgLatency {
    pub analyze: Option<f64>,
    pub generate: Option<f64>,
    pub humanize: Option<f64>,
    pub detect: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(MetricsCounters::default()),
            latencies: Mutex::new(Vec::new()),
        }
    }

    pub fn inc_styles_analyzed(&self) {
        self.counters.lock().styles_analyzed += 1;
    }

    pub fn inc_mimics_generated(&self) {
        self.counters.lock().mimics_generated += 1;
    }

    pub fn inc_texts_humanized(&self) {
        self.counters.lock().texts_humanized += 1;
    }

    pub fn inc_detections_run(&self) {
        self.counters.lock().detections_run += 1;
    }

    pub fn inc_works_saved(&self) {
        self.counters.lock().works_saved += 1;
    }

    pub fn inc_work_save_failures(&self) {
        self.counters.lock().work_save_failures += 1;
    }

    pub fn inc_unlocks(&self) {
        self.counters.lock().unlocks += 1;
    }

    pub fn inc_error(&self, code: ErrorCode) {
        let mut c = self.counters.lock();
        match code {
            ErrorCode::Validation => c.errors_validation += 1,
            ErrorCode::Transport | ErrorCode::Api | ErrorCode::ResponseShape => {
                c.errors_upstream += 1
            }
            ErrorCode::Extraction | ErrorCode::EmptyContent => c.errors_extraction += 1,
            ErrorCode::InvalidState | ErrorCode::NotFound => c.errors_state += 1,
            ErrorCode::Storage => c.errors_storage += 1,
            ErrorCode::Payment => c.errors_payment += 1,
            ErrorCode::Config | ErrorCode::Internal => c.errors_internal += 1,
        }
    }

    pub fn record_latency(&self, phase: &str, duration_ms: u64) {
        let record = LatencyRecord {
            phase: phase.to_string(),
            duration_ms,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let mut latencies = self.latencies.lock();
        latencies.push(record);
        if latencies.len() > LATENCY_CAP {
            let excess = latencies.len() - LATENCY_CAP;
            latencies.drain(0..excess);
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let c = self.counters.lock();
        let latencies = self.latencies.lock();

        let avg = |phase: &str| -> Option<f64> {
            let vals: Vec<f64> = latencies
                .iter()
                .filter(|r| r.phase == phase)
                .map(|r| r.duration_ms as f64)
                .collect();
            if vals.is_empty() {
                None
            } else {
                Some(vals.iter().sum::<f64>() / vals.len() as f64)
            }
        };

        let recent: Vec<LatencyRecord> = latencies.iter().rev().take(20).cloned().collect();

        MetricsSummary {
            styles_analyzed: c.styles_analyzed,
            mimics_generated: c.mimics_generated,
            texts_humanized: c.texts_humanized,
            detections_run: c.detections_run,
            works_saved: c.works_saved,
            work_save_failures: c.work_save_failures,
            unlocks: c.unlocks,
            error_counts: ErrorCounts {
                validation: c.errors_validation,
                upstream: c.errors_upstream,
                extraction: c.errors_extraction,
                state: c.errors_state,
                storage: c.errors_storage,
                payment: c.errors_payment,
                internal: c.errors_internal,
            },
            avg_latency_ms: AvgLatency {
                analyze: avg("analyze"),
                generate: avg("generate"),
                humanize: avg("humanize"),
                detect: avg("detect"),
            },
            recent_latencies: recent,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
