//! ldaviz Core - Domain models, errors, and configuration
//!
//! This crate contains the domain types shared by the numeric engines, the
//! storage adapters and the workspace orchestrator.

pub mod config;
pub mod error;
pub mod models;

pub use error::{LdavizError, Result};
