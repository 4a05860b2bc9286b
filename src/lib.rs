pub mod api_client;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod sink;
pub mod storage;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use error::{RandimgError, Result};
pub use tracker::{RateLimit, RequestTracker};
