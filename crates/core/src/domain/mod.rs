pub mod detection;
pub mod error;
pub mod job;
pub mod lenient;
pub mod settings;
pub mod style;
pub mod types;
pub mod wizard;
