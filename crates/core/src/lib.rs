//! Core business logic for Bahi.
//!
//! This crate contains pure settlement logic with ZERO web or database
//! dependencies. Persistence is reached only through the
//! [`settlement::SettlementStore`] port.
//!
//! # Modules
//!
//! - `settlement` - Row pricing, settlement totals, carry-over and batch entry

pub mod settlement;
