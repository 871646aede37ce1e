pub mod alert;
pub mod analyzer;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod pending;
pub mod query;
pub mod rpc;
pub mod scanner;
pub mod scheduler;
