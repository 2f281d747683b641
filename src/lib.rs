//! Escola Backend Library
//!
//! School-management backend: fund-accounting ledger, balance reports,
//! roster records, and a token-protected HTTP API.

pub mod api;
pub mod auth;
pub mod balance;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod roster;
