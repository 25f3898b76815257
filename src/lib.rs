pub mod api;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod session;
pub mod stream;
pub mod ui;
