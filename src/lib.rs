//! Ledger holdings - reports and portfolio export over a ledger's final holdings
//!
//! This library loads a snapshot of holdings, converts and aggregates them,
//! renders holdings, cash and net worth reports, and exports the portfolio
//! as an OFX document for external portfolio software.

pub mod config;
pub mod error;
pub mod export;
pub mod holdings;
pub mod importers;
pub mod pricing;
pub mod reports;
pub mod utils;
