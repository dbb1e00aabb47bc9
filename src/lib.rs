pub mod config;
pub mod display;
pub mod errors;
pub mod harness;
pub mod report;
pub mod summary;
pub mod sweep;
pub mod types;
