//! PostgreSQL implementation of CaptureLedger.
//!
//! The correlation column is stored verbatim, malformed or not, so an entry
//! can be reconciled by hand even when its correlation cannot be decoded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{Currency, Money};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{CaptureAck, CaptureLedger};

/// PostgreSQL implementation of the CaptureLedger port.
pub struct PostgresCaptureLedger {
    pool: PgPool,
}

impl PostgresCaptureLedger {
    /// Creates a new PostgresCaptureLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CaptureAckRow {
    payment_id: String,
    provider_order_id: String,
    correlation: String,
    amount_minor: i64,
    currency: String,
    acknowledged_at: DateTime<Utc>,
    recorded_at: Option<DateTime<Utc>>,
}

impl TryFrom<CaptureAckRow> for CaptureAck {
    type Error = DomainError;

    fn try_from(row: CaptureAckRow) -> Result<Self, Self::Error> {
        let currency = Currency::parse(&row.currency)
            .map_err(|e| DomainError::database(format!("Invalid currency: {}", e)))?;
        let amount = Money::from_minor_units(row.amount_minor, currency)
            .map_err(|e| DomainError::database(format!("Invalid amount: {}", e)))?;

        Ok(CaptureAck {
            payment_id: row.payment_id,
            provider_order_id: row.provider_order_id,
            correlation: row.correlation,
            amount,
            acknowledged_at: Timestamp::from_datetime(row.acknowledged_at),
            recorded_at: row.recorded_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl CaptureLedger for PostgresCaptureLedger {
    async fn acknowledge(&self, ack: &CaptureAck) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO capture_ledger (
                payment_id, provider_order_id, correlation, amount_minor,
                currency, acknowledged_at, recorded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (payment_id) DO NOTHING
            "#,
        )
        .bind(&ack.payment_id)
        .bind(&ack.provider_order_id)
        .bind(&ack.correlation)
        .bind(ack.amount.minor_units())
        .bind(ack.amount.currency().code())
        .bind(ack.acknowledged_at.as_datetime())
        .bind(ack.recorded_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to acknowledge capture: {}", e)))?;

        Ok(())
    }

    async fn mark_recorded(&self, payment_id: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE capture_ledger
            SET recorded_at = NOW()
            WHERE payment_id = $1 AND recorded_at IS NULL
            "#,
        )
        .bind(payment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to mark capture recorded: {}", e)))?;

        Ok(())
    }

    async fn list_unrecorded(&self) -> Result<Vec<CaptureAck>, DomainError> {
        let rows: Vec<CaptureAckRow> = sqlx::query_as(
            r#"
            SELECT payment_id, provider_order_id, correlation, amount_minor,
                   currency, acknowledged_at, recorded_at
            FROM capture_ledger
            WHERE recorded_at IS NULL
            ORDER BY acknowledged_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list unrecorded captures: {}", e)))?;

        rows.into_iter().map(CaptureAck::try_from).collect()
    }
}
