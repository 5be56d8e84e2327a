//! Foundation types for the personal finance ledger (PFL).
//!
//! This crate provides the identifier, temporal, and classification types
//! used throughout the PFL system. Every other PFL crate depends on
//! `pfl-types`.
//!
//! # Key Types
//!
//! - [`UserId`] -- Partitioning key for per-user ledger state
//! - [`ItemId`] -- Identity of a line item within a collection
//! - [`CanonicalDate`] -- Date-only value in `YYYY-MM-DD` form
//! - [`Frequency`] -- Recurrence of a cashflow schedule
//! - [`CashflowKind`] -- Income or expense classification
//! - [`AssetKind`] -- The asset collections the scheduler and router know

pub mod asset;
pub mod cashflow;
pub mod error;
pub mod identity;
pub mod temporal;

pub use asset::AssetKind;
pub use cashflow::{CashflowKind, Frequency};
pub use error::TypeError;
pub use identity::{ItemId, UserId};
pub use temporal::{parse_timestamp, CanonicalDate};
