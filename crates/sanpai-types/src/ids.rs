//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every user-facing entity has a strongly-typed ID to prevent accidental
//! mixing of identifiers at compile time. Row identifiers use UUID v7
//! (time-ordered) for efficient database indexing.
//!
//! Reference data (ability definitions, level tiers) is keyed by small
//! serial integers instead — see [`AbilityId`] — because it is seeded by
//! migration and referenced by hand in fixtures and admin tooling.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a registered user.
    UserId
}

define_id! {
    /// Unique identifier for a shrine.
    ShrineId
}

define_id! {
    /// Unique identifier for a deity enshrined at one or more shrines.
    DeityId
}

define_id! {
    /// Unique identifier for a subscription row.
    SubscriptionId
}

define_id! {
    /// Unique identifier for an ability ledger entry (audit log row).
    LedgerEntryId
}

define_id! {
    /// Unique identifier for a remote prayer event.
    RemotePrayerEventId
}

/// Identifier for an ability definition.
///
/// Abilities are reference data seeded by migration with small serial ids,
/// so this wraps an `i32` rather than a UUID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct AbilityId(pub i32);

impl AbilityId {
    /// Return the inner integer value.
    pub const fn into_inner(self) -> i32 {
        self.0
    }
}

impl core::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for AbilityId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<AbilityId> for i32 {
    fn from(id: AbilityId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_distinct_types_with_distinct_values() {
        let a = UserId::new();
        let b = UserId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn uuid_roundtrip() {
        let id = ShrineId::new();
        let raw: Uuid = id.into();
        assert_eq!(ShrineId::from(raw), id);
    }

    #[test]
    fn ability_id_display() {
        assert_eq!(AbilityId(7).to_string(), "7");
    }
}
