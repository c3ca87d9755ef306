//! SQLite-backed persistence for router/pair lineage, transactions, and USD pricing.
//!
//! This crate provides:
//! - A crash-safe [`Store`] whose multi-table writes commit in one transaction
//! - Row models mapping `u128`/`i128` domain quantities to `TEXT` columns
//! - Per-entity repositories for typed read access

pub mod models;
pub mod repositories;
pub mod schema;
pub mod store;

pub use repositories::{
    HeightRepository, PairRepository, PriceRepository, RouterRepository, TransactionRepository,
};
pub use store::Store;
