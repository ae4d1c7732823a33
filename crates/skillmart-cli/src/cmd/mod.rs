pub mod api;
pub mod asset;
pub mod config;
pub mod flag;
pub mod health;
pub mod plugin;
pub mod secrets;
