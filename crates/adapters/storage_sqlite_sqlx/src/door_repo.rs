//! `SQLite` implementation of [`DoorRepository`].
//!
//! Each door is one row keyed by name; the whole [`DoorRecord`] is stored
//! as a JSON document and replaced on every save.

use sqlx::SqlitePool;

use doorwatch_app::ports::DoorRepository;
use doorwatch_domain::door::DoorName;
use doorwatch_domain::error::DoorwatchError;
use doorwatch_domain::record::DoorRecord;

use crate::error::StorageError;

/// `SQLite`-backed door repository.
#[derive(Clone)]
pub struct SqliteDoorRepository {
    pool: SqlitePool,
}

impl SqliteDoorRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DoorRepository for SqliteDoorRepository {
    async fn load(&self, door: &DoorName) -> Result<Option<DoorRecord>, DoorwatchError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT record FROM doors WHERE name = ?")
            .bind(door.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let Some((json,)) = row else {
            return Ok(None);
        };
        let record = serde_json::from_str(&json).map_err(StorageError::from)?;
        Ok(Some(record))
    }

    async fn save(&self, door: &DoorName, record: &DoorRecord) -> Result<(), DoorwatchError> {
        let json = serde_json::to_string(record).map_err(StorageError::from)?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO doors (name, record, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(name) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at",
        )
        .bind(door.as_str())
        .bind(&json)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        tracing::trace!(door = %door, "door record saved");
        Ok(())
    }
}
