pub mod admin;
pub mod computed;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod graphql;
pub mod import;
pub mod jurisdictions;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod state;
pub mod storage;
pub mod web;
