//! Data models shared by the store, the REST layer and the realtime hub

pub mod ansible;
pub mod deployment;
pub mod resource;
pub mod template;
pub mod terraform;
