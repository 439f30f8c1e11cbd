//! Ability-tree orchestration: purchase checks, purchases, and resets.
//!
//! The actual mutations are single transactions in the data layer; this
//! service shapes their inputs and outputs for the API and provides the
//! read-only views (purchase eligibility, the owned list) that need no
//! lock.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sanpai_db::{AbilityStore, PurchaseReceipt, ResetReceipt, UserStore};
use sanpai_progression::{check_purchase, validate_prerequisites};
use sanpai_types::{AbilityDefinition, AbilityId, UserId};

use crate::error::CoreError;

/// An owned ability joined with its definition, for the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedAbility {
    /// The ability's reference data.
    pub definition: AbilityDefinition,
    /// When the user purchased it.
    pub acquired_at: DateTime<Utc>,
}

/// Orchestrates ability purchases and resets.
pub struct AbilityService<'a> {
    pool: &'a PgPool,
}

impl<'a> AbilityService<'a> {
    /// Create an ability service bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read-only purchase eligibility check.
    ///
    /// The purchase transaction re-validates under the user row lock;
    /// this exists for UI affordances and costs no lock.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PurchaseDenied`] with the first failed gate,
    /// or the usual lookup errors.
    pub async fn can_purchase(
        &self,
        user_id: UserId,
        ability_id: AbilityId,
    ) -> Result<(), CoreError> {
        let user = UserStore::new(self.pool).get_user(user_id).await?;
        let abilities = AbilityStore::new(self.pool);
        let def = abilities.get_definition(ability_id).await?;
        let owned = abilities.owned_ability_ids(user_id).await?;

        check_purchase(&def, &owned, user.ability_points)?;
        Ok(())
    }

    /// Purchase an ability (atomic debit + grant + ledger append).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PurchaseDenied`] when a gate refuses,
    /// [`CoreError::AbilityNotFound`] / [`CoreError::UserNotFound`] for
    /// missing rows, or a storage error.
    pub async fn purchase(
        &self,
        user_id: UserId,
        ability_id: AbilityId,
    ) -> Result<PurchaseReceipt, CoreError> {
        let receipt = AbilityStore::new(self.pool)
            .purchase(user_id, ability_id, Utc::now())
            .await?;
        Ok(receipt)
    }

    /// Reset the ability tree, refunding every owned ability's cost.
    ///
    /// Requires an active `reset_abilities` subscription, which the reset
    /// consumes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SubscriptionRequired`] without a live
    /// subscription, or a storage error.
    pub async fn reset(&self, user_id: UserId) -> Result<ResetReceipt, CoreError> {
        let receipt = AbilityStore::new(self.pool)
            .reset(user_id, Utc::now())
            .await?;
        Ok(receipt)
    }

    /// The user's owned abilities joined with their definitions.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UserNotFound`] for an unknown user, or a
    /// storage error.
    pub async fn owned(&self, user_id: UserId) -> Result<Vec<OwnedAbility>, CoreError> {
        // Distinguish "no abilities" from "no such user".
        UserStore::new(self.pool).get_user(user_id).await?;

        let abilities = AbilityStore::new(self.pool);
        let owned = abilities.list_owned(user_id).await?;
        let defs = abilities.list_definitions().await?;

        let mut joined = Vec::with_capacity(owned.len());
        for ua in owned {
            let def = defs.get(&ua.ability_id).ok_or_else(|| {
                CoreError::Configuration(format!(
                    "owned ability {} has no definition",
                    ua.ability_id
                ))
            })?;
            joined.push(OwnedAbility {
                definition: def.clone(),
                acquired_at: ua.acquired_at,
            });
        }
        Ok(joined)
    }

    /// Validate the ability table's prerequisite graph.
    ///
    /// Run at startup: a dangling prerequisite or a cycle is an
    /// operational problem that should stop the server before it serves
    /// traffic.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] describing the violation.
    pub async fn validate_reference_data(&self) -> Result<(), CoreError> {
        let defs = AbilityStore::new(self.pool).list_definitions().await?;
        validate_prerequisites(&defs)?;
        tracing::info!(abilities = defs.len(), "Ability reference data validated");
        Ok(())
    }
}
