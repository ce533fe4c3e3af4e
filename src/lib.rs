pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod init;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

pub use error::ProseError;
