//! Shared types, errors, and configuration for Bahi.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for customers and settlements
//! - Amount helpers for signed balances and two-place display
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, SettlementConfig, StorageBackend};
pub use error::{AppError, AppResult};
