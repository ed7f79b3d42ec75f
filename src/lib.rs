pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod reports;
pub mod storage;
pub mod web;
