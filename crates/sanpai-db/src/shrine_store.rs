//! Shrine lookups and the enshrined-deity fan-out list.

use sqlx::PgPool;
use uuid::Uuid;

use sanpai_types::{DeityId, Shrine, ShrineId};

use crate::error::DbError;

/// Operations on the `shrines`, `deities`, and `shrine_deities` tables.
pub struct ShrineStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ShrineStore<'a> {
    /// Create a new shrine store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a shrine by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::ShrineNotFound`] if no row exists.
    pub async fn get_shrine(&self, shrine_id: ShrineId) -> Result<Shrine, DbError> {
        let row = sqlx::query_as::<_, ShrineRow>(
            r"SELECT id, name, latitude, longitude, created_at
              FROM shrines
              WHERE id = $1",
        )
        .bind(shrine_id.into_inner())
        .fetch_optional(self.pool)
        .await?
        .ok_or(DbError::ShrineNotFound(shrine_id))?;

        Ok(row.into_shrine())
    }

    /// List the deities enshrined at a shrine.
    ///
    /// A physical prayer fans out to one deity-stat increment per entry;
    /// a shrine with no enshrinement rows simply fans out to nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn enshrined_deities(&self, shrine_id: ShrineId) -> Result<Vec<DeityId>, DbError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"SELECT deity_id
              FROM shrine_deities
              WHERE shrine_id = $1
              ORDER BY deity_id",
        )
        .bind(shrine_id.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| DeityId::from(id)).collect())
    }
}

/// A row from the `shrines` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ShrineRow {
    /// Shrine UUID.
    id: Uuid,
    /// Shrine name.
    name: String,
    /// Latitude in degrees.
    latitude: f64,
    /// Longitude in degrees.
    longitude: f64,
    /// Row creation timestamp.
    created_at: chrono::DateTime<chrono::Utc>,
}

impl ShrineRow {
    /// Convert to the domain [`Shrine`] type.
    fn into_shrine(self) -> Shrine {
        Shrine {
            id: ShrineId::from(self.id),
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: self.created_at,
        }
    }
}
