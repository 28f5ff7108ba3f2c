pub mod client;
pub mod error;
pub mod types;

pub use client::ScoringClient;
pub use error::ApiError;
pub use types::{BatchScoreResponse, ManualScoreResponse};
