//! wallet_api Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod service;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use ledger::{Ledger, LedgerError};
pub use service::{Outcome, ServiceError, UserService};
