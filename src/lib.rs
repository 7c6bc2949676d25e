//! FlexFit plan generation: free-text workout requests in, generated
//! multi-day plans out.

pub mod aggregator;
pub mod client;
pub mod commands;
pub mod config;
pub mod interpreter;
pub mod models;
pub mod orchestrator;
pub mod patterns;

#[cfg(test)]
mod test_utils;
