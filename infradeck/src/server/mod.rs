//! HTTP server: REST collaborator and the realtime endpoint

pub mod api;
pub mod handlers;
pub mod serve;
pub mod state;
