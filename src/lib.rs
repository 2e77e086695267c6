pub mod config;
pub mod context;
pub mod file_svc;
pub mod logger;
pub mod mirror_service;
pub mod remote_store;
pub mod report;
pub mod retention_service;
pub mod run_service;
pub mod snapshot_service;
pub mod time_provider;
