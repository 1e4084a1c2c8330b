//! Infradeck Library
//!
//! Realtime execution hub for an infrastructure dashboard: runs Terraform
//! applies and Ansible playbooks (locally or simulated), tracks them as
//! deployments and streams their output to WebSocket clients.

pub mod app;
pub mod deploy;
pub mod errors;
pub mod filesys;
pub mod hub;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod utils;
pub mod workers;
