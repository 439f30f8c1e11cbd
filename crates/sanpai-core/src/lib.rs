//! Prayer and progression orchestration for the Sanpai service.
//!
//! This crate composes the pure rules (`sanpai-progression`,
//! `sanpai-geo`) with the transactional stores (`sanpai-db`) into the
//! three request flows: physical prayer, remote prayer, and ability
//! purchase/reset. No state lives in this crate -- every request reads
//! and writes through the store, and per-user serialization comes from
//! the data layer's row locks.
//!
//! # Modules
//!
//! - [`resolver`] -- Derived pray radius and daily worship quota
//! - [`prayer`] -- The physical and remote prayer flows
//! - [`abilities`] -- Ability purchase/reset orchestration
//! - [`quota`] -- Server-local day windows and the quota tracker
//! - [`config`] -- YAML service configuration
//! - [`error`] -- The request-level error taxonomy

pub mod abilities;
pub mod config;
pub mod error;
pub mod prayer;
pub mod quota;
pub mod resolver;

// Re-export primary types at crate root.
pub use abilities::{AbilityService, OwnedAbility};
pub use sanpai_progression::PurchaseDenied;
pub use config::{ConfigError, DatabaseConfig, GameplayConfig, ServerConfig, ServiceConfig};
pub use error::CoreError;
pub use prayer::{PrayerOutcome, PrayerService};
pub use quota::{DayWindow, QuotaTracker, local_day_window};
pub use resolver::{DerivedEffects, EffectResolver, LevelInfo};
