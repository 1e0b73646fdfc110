//! PostgreSQL implementation of PendingOrderStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{CorrelationId, Currency, Money};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{PendingOrder, PendingOrderStore};

/// PostgreSQL implementation of the PendingOrderStore port.
pub struct PostgresPendingOrderStore {
    pool: PgPool,
}

impl PostgresPendingOrderStore {
    /// Creates a new PostgresPendingOrderStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PendingOrderRow {
    provider_order_id: String,
    correlation: String,
    amount_minor: i64,
    currency: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<PendingOrderRow> for PendingOrder {
    type Error = DomainError;

    fn try_from(row: PendingOrderRow) -> Result<Self, Self::Error> {
        let correlation = CorrelationId::parse(&row.correlation).ok_or_else(|| {
            DomainError::database(format!(
                "Invalid correlation in pending order row: '{}'",
                row.correlation
            ))
        })?;
        let currency = Currency::parse(&row.currency)
            .map_err(|e| DomainError::database(format!("Invalid currency: {}", e)))?;
        let amount = Money::from_minor_units(row.amount_minor, currency)
            .map_err(|e| DomainError::database(format!("Invalid amount: {}", e)))?;

        Ok(PendingOrder {
            provider_order_id: row.provider_order_id,
            correlation,
            amount,
            created_at: Timestamp::from_datetime(row.created_at),
            resolved_at: row.resolved_at.map(Timestamp::from_datetime),
        })
    }
}

#[async_trait]
impl PendingOrderStore for PostgresPendingOrderStore {
    async fn record(&self, order: &PendingOrder) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO pending_orders (
                provider_order_id, correlation, amount_minor, currency, created_at, resolved_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (provider_order_id) DO NOTHING
            "#,
        )
        .bind(&order.provider_order_id)
        .bind(order.correlation.as_str())
        .bind(order.amount.minor_units())
        .bind(order.amount.currency().code())
        .bind(order.created_at.as_datetime())
        .bind(order.resolved_at.as_ref().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record pending order: {}", e)))?;

        Ok(())
    }

    async fn mark_resolved(&self, provider_order_id: &str) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE pending_orders
            SET resolved_at = NOW()
            WHERE provider_order_id = $1 AND resolved_at IS NULL
            "#,
        )
        .bind(provider_order_id)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to resolve pending order: {}", e)))?;

        Ok(())
    }

    async fn list_unresolved_before(
        &self,
        cutoff: &Timestamp,
    ) -> Result<Vec<PendingOrder>, DomainError> {
        let rows: Vec<PendingOrderRow> = sqlx::query_as(
            r#"
            SELECT provider_order_id, correlation, amount_minor, currency, created_at, resolved_at
            FROM pending_orders
            WHERE resolved_at IS NULL AND created_at <= $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(cutoff.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list pending orders: {}", e)))?;

        rows.into_iter().map(PendingOrder::try_from).collect()
    }

    async fn purge_unresolved_before(&self, cutoff: &Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM pending_orders WHERE resolved_at IS NULL AND created_at <= $1",
        )
        .bind(cutoff.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to purge pending orders: {}", e)))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(correlation: &str) -> PendingOrderRow {
        PendingOrderRow {
            provider_order_id: "ORDER-1".to_string(),
            correlation: correlation.to_string(),
            amount_minor: 100_000,
            currency: "RUB".to_string(),
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[test]
    fn row_converts_to_pending_order() {
        let order = PendingOrder::try_from(row("U1:S1")).unwrap();
        assert_eq!(order.provider_order_id, "ORDER-1");
        assert_eq!(order.correlation.as_str(), "U1:S1");
        assert_eq!(order.amount.minor_units(), 100_000);
        assert!(order.resolved_at.is_none());
    }

    #[test]
    fn row_with_malformed_correlation_is_rejected() {
        assert!(PendingOrder::try_from(row("no-delimiter")).is_err());
    }
}
