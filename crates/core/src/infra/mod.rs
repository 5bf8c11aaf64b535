pub mod extract;
pub mod llm;
pub mod metrics;
pub mod payment;
pub mod storage;
