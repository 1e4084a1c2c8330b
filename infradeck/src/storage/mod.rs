//! Storage: on-disk layout, settings and the record store

pub mod layout;
pub mod memory;
pub mod provider;
pub mod seed;
pub mod settings;
