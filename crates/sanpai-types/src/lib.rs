//! Shared type definitions for the Sanpai shrine-visiting service.
//!
//! This crate is the single source of truth for all types used across the
//! Sanpai workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the web frontend.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifier wrappers for all entities
//! - [`enums`] -- Enumeration types (effects, subscriptions, stat periods)
//! - [`structs`] -- Persisted entity structs (users, shrines, abilities, ...)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EffectType, PrayerTarget, StatPeriod, SubscriptionType};
pub use ids::{
    AbilityId, DeityId, LedgerEntryId, RemotePrayerEventId, ShrineId, SubscriptionId, UserId,
};
pub use structs::{
    AbilityDefinition, AbilityLedgerEntry, Deity, LevelTier, Position, PrayerStat,
    RemotePrayerEvent, Shrine, Subscription, User, UserAbility,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::UserId::export_all();
        let _ = crate::ids::ShrineId::export_all();
        let _ = crate::ids::DeityId::export_all();
        let _ = crate::ids::SubscriptionId::export_all();
        let _ = crate::ids::LedgerEntryId::export_all();
        let _ = crate::ids::RemotePrayerEventId::export_all();
        let _ = crate::ids::AbilityId::export_all();

        // Enums
        let _ = crate::enums::EffectType::export_all();
        let _ = crate::enums::SubscriptionType::export_all();
        let _ = crate::enums::PrayerTarget::export_all();
        let _ = crate::enums::StatPeriod::export_all();

        // Structs
        let _ = crate::structs::Position::export_all();
        let _ = crate::structs::User::export_all();
        let _ = crate::structs::LevelTier::export_all();
        let _ = crate::structs::Shrine::export_all();
        let _ = crate::structs::Deity::export_all();
        let _ = crate::structs::AbilityDefinition::export_all();
        let _ = crate::structs::UserAbility::export_all();
        let _ = crate::structs::AbilityLedgerEntry::export_all();
        let _ = crate::structs::Subscription::export_all();
        let _ = crate::structs::PrayerStat::export_all();
        let _ = crate::structs::RemotePrayerEvent::export_all();
    }
}
