// Library surface for the binary and the integration tests.
// Keep terminal setup and CLI parsing in main.rs.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod logging;
pub mod notify;
pub mod runtime;
pub mod settings_editor;
pub mod ui;
pub mod units;
pub mod update;
pub mod validation;
