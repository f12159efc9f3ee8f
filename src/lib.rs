// Library surface for the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod cli;
pub mod config;
pub mod input;
pub mod metrics;
pub mod report;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod target;
pub mod telemetry;
pub mod text;
pub mod ui;
