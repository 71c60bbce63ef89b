pub mod application;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod link;
pub mod record;
pub mod resolver;
pub mod runtime;
