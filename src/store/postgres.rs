//! PostgreSQL ride repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::aggregate::{Ride, RideDetails};
use crate::domain::{Cost, StatusTrack};

use super::repository::{Page, PageRequest, RideFilter, RideRepository};
use super::StoreError;

const RIDE_COLUMNS: &str = r#"
    id, driver_id, passenger_id, address_from, address_to,
    driver_status, passenger_status, cost, version, created_at, updated_at
"#;

/// Row shape of the `rides` table
#[derive(Debug, sqlx::FromRow)]
struct RideRecord {
    id: Uuid,
    driver_id: i64,
    passenger_id: i64,
    address_from: String,
    address_to: String,
    driver_status: String,
    passenger_status: String,
    cost: Decimal,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RideRecord> for Ride {
    type Error = StoreError;

    fn try_from(record: RideRecord) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            ride_id: record.id,
            reason,
        };

        let driver_status = record
            .driver_status
            .parse()
            .map_err(|e: crate::domain::UnknownStatus| corrupt(e.to_string()))?;
        let passenger_status = record
            .passenger_status
            .parse()
            .map_err(|e: crate::domain::UnknownStatus| corrupt(e.to_string()))?;
        let cost = Cost::new(record.cost).map_err(|e| corrupt(e.to_string()))?;

        Ok(Ride {
            id: record.id,
            details: RideDetails {
                driver_id: record.driver_id,
                passenger_id: record.passenger_id,
                address_from: record.address_from,
                address_to: record.address_to,
            },
            driver_status,
            passenger_status,
            cost,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Ride repository backed by the `rides` table
#[derive(Debug, Clone)]
pub struct PgRideRepository {
    pool: PgPool,
}

impl PgRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<i64>, StoreError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM rides WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(version)
    }
}

#[async_trait]
impl RideRepository for PgRideRepository {
    async fn insert(&self, ride: &Ride) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO rides (
                id, driver_id, passenger_id, address_from, address_to,
                driver_status, passenger_status, cost, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(ride.id)
        .bind(ride.details.driver_id)
        .bind(ride.details.passenger_id)
        .bind(&ride.details.address_from)
        .bind(&ride.details.address_to)
        .bind(ride.driver_status.as_str())
        .bind(ride.passenger_status.as_str())
        .bind(ride.cost.value())
        .bind(ride.version)
        .bind(ride.created_at)
        .bind(ride.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate(ride.id));
        }

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Ride>, StoreError> {
        let record: Option<RideRecord> =
            sqlx::query_as(&format!("SELECT {} FROM rides WHERE id = $1", RIDE_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        record.map(Ride::try_from).transpose()
    }

    async fn update(&self, ride: &Ride) -> Result<Ride, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Cost and created_at are never rewritten
        let record: Option<RideRecord> = sqlx::query_as(&format!(
            r#"
            UPDATE rides
            SET driver_id = $3,
                passenger_id = $4,
                address_from = $5,
                address_to = $6,
                driver_status = $7,
                passenger_status = $8,
                updated_at = $9,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {}
            "#,
            RIDE_COLUMNS
        ))
        .bind(ride.id)
        .bind(ride.version)
        .bind(ride.details.driver_id)
        .bind(ride.details.passenger_id)
        .bind(&ride.details.address_from)
        .bind(&ride.details.address_to)
        .bind(ride.driver_status.as_str())
        .bind(ride.passenger_status.as_str())
        .bind(ride.updated_at)
        .fetch_optional(&mut *tx)
        .await?;

        let record = match record {
            Some(record) => record,
            None => {
                let found = Self::current_version(&mut tx, ride.id).await?;
                tx.rollback().await?;
                return Err(match found {
                    Some(_) => StoreError::VersionConflict {
                        ride_id: ride.id,
                        expected: ride.version,
                    },
                    None => StoreError::NotFound(ride.id),
                });
            }
        };

        tx.commit().await?;

        Ride::try_from(record)
    }

    async fn list(&self, filter: RideFilter, page: PageRequest) -> Result<Page<Ride>, StoreError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM rides
            WHERE ($1::BIGINT IS NULL OR driver_id = $1)
              AND ($2::BIGINT IS NULL OR passenger_id = $2)
            "#,
        )
        .bind(filter.driver_id())
        .bind(filter.passenger_id())
        .fetch_one(&self.pool)
        .await?;

        let records: Vec<RideRecord> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM rides
            WHERE ($1::BIGINT IS NULL OR driver_id = $1)
              AND ($2::BIGINT IS NULL OR passenger_id = $2)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
            RIDE_COLUMNS
        ))
        .bind(filter.driver_id())
        .bind(filter.passenger_id())
        .bind(i64::from(page.limit()))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = records
            .into_iter()
            .map(Ride::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            page: page.page(),
            limit: page.limit(),
            total: total.max(0) as u64,
        })
    }
}
