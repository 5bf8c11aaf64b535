pub mod app_service;
pub mod job_queue;
pub mod pipeline;
