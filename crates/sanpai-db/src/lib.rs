//! `PostgreSQL` data layer for the Sanpai service.
//!
//! Every entity lives in one transactional relational store. Cross-row
//! mutations that must appear atomic -- experience grants, ability
//! purchases, ability resets -- run as single transactions with row-level
//! locks on the user, so concurrent operations for the *same* user
//! serialize while different users never contend. Statistics increments
//! use unique-constraint-backed upserts instead of read-then-write.
//!
//! # Modules
//!
//! - [`postgres`] -- Connection pool configuration and migrations
//! - [`user_store`] -- User lookups and the transactional experience grant
//! - [`shrine_store`] -- Shrines and the enshrined-deity fan-out list
//! - [`ability_store`] -- Ability reference data, purchases, resets, ledger
//! - [`subscription_store`] -- Lazy-expiry subscription lookups
//! - [`stats_store`] -- The eight prayer statistics tables (4 periods x 2 kinds)
//! - [`quota_store`] -- Remote prayer events for the daily worship quota
//! - [`error`] -- [`DbError`]

pub mod ability_store;
pub mod error;
pub mod postgres;
pub mod quota_store;
pub mod shrine_store;
pub mod stats_store;
pub mod subscription_store;
pub mod user_store;

// Re-export primary types at crate root.
pub use ability_store::{AbilityStore, PurchaseReceipt, ResetReceipt};
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use quota_store::QuotaStore;
pub use shrine_store::ShrineStore;
pub use stats_store::{StatBuckets, StatsStore};
pub use subscription_store::SubscriptionStore;
pub use user_store::UserStore;
