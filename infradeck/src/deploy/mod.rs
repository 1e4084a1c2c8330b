//! Execution pipeline: workspaces, processes, strategies and deployment tracking

pub mod fsm;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod strategy;
pub mod tfvars;
pub mod tracker;
pub mod workspace;
