//! Library Desk
//!
//! Book catalog and student loan ledger for a small library. The catalog
//! owns books and their copy counts; the ledger issues and takes back copies
//! and keeps the counts honest while doing so.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
