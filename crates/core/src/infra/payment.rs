use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// 決済エラー
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
}

/// 決済結果
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub receipt_id: String,
    pub amount_cents: u32,
    pub paid_at: String,
}

/// 解錠用の決済窓口
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, user_id: Option<&str>, amount_cents: u32) -> Result<Receipt, PaymentError>;
}

/// 擬似決済: 一定時間待って必ず成功する。実際の取引は行わない
pub struct MockPaymentGateway {
    delay: Duration,
}

impl MockPaymentGateway {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(&self, user_id: Option<&str>, amount_cents: u32) -> Result<Receipt, PaymentError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        log::info!(
            "擬似決済完了: user={} amount={amount_cents}",
            user_id.unwrap_or("anonymous")
        );
        Ok(Receipt {
            receipt_id: uuid::Uuid::new_v4().to_string(),
            amount_cents,
            paid_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
