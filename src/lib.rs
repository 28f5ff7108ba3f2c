pub mod api;
pub mod auth;
pub mod browser;
pub mod config;
pub mod export;
pub mod outreach;
pub mod output;
pub mod report;
pub mod risk;
pub mod session;
pub mod stderr_buffer;
pub mod tui;
pub mod workflow;
