//! PostgreSQL implementation of PurchaseRepository.
//!
//! Insert idempotency rides on the unique index over `payment_id`:
//! `ON CONFLICT DO NOTHING` followed by a select of the surviving row, so
//! concurrent duplicate captures converge on one purchase without an
//! application-level lock. Deactivation is a conditional update for the same
//! reason.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{ContentRef, Currency, ItemType, Money, Purchase};
use crate::domain::foundation::{ContentId, DomainError, PurchaseId, Timestamp, UserId};
use crate::ports::{InsertOutcome, PurchaseRepository};

/// PostgreSQL implementation of the PurchaseRepository port.
pub struct PostgresPurchaseRepository {
    pool: PgPool,
}

impl PostgresPurchaseRepository {
    /// Creates a new PostgresPurchaseRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PURCHASE_COLUMNS: &str = "id, user_id, item_type, content_id, payment_id, amount_minor, \
     currency, payment_method, is_active, expires_at, created_at";

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    user_id: String,
    item_type: String,
    content_id: String,
    payment_id: String,
    amount_minor: i64,
    currency: String,
    payment_method: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let invalid = |what: &str, detail: String| {
            DomainError::database(format!("Invalid {} in purchase row: {}", what, detail))
        };

        let user_id =
            UserId::new(row.user_id).map_err(|e| invalid("user_id", e.to_string()))?;
        let content_id =
            ContentId::new(row.content_id).map_err(|e| invalid("content_id", e.to_string()))?;
        let content_ref = match ItemType::parse(&row.item_type) {
            Some(ItemType::Set) => ContentRef::set(content_id),
            Some(ItemType::Course) => ContentRef::course(content_id),
            None => return Err(invalid("item_type", row.item_type)),
        };
        let currency =
            Currency::parse(&row.currency).map_err(|e| invalid("currency", e.to_string()))?;
        let amount = Money::from_minor_units(row.amount_minor, currency)
            .map_err(|e| invalid("amount_minor", e.to_string()))?;

        Ok(Purchase {
            id: PurchaseId::from_uuid(row.id),
            user_id,
            content_ref,
            payment_id: row.payment_id,
            amount,
            payment_method: row.payment_method,
            is_active: row.is_active,
            expires_at: row.expires_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl PurchaseRepository for PostgresPurchaseRepository {
    async fn insert_if_absent(&self, purchase: &Purchase) -> Result<InsertOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO purchases (
                id, user_id, item_type, content_id, payment_id, amount_minor,
                currency, payment_method, is_active, expires_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (payment_id) DO NOTHING
            "#,
        )
        .bind(purchase.id.as_uuid())
        .bind(purchase.user_id.as_str())
        .bind(purchase.content_ref.item_type().as_str())
        .bind(purchase.content_ref.content_id().as_str())
        .bind(&purchase.payment_id)
        .bind(purchase.amount.minor_units())
        .bind(purchase.amount.currency().code())
        .bind(&purchase.payment_method)
        .bind(purchase.is_active)
        .bind(purchase.expires_at.as_ref().map(|t| *t.as_datetime()))
        .bind(purchase.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert purchase: {}", e)))?;

        // Whichever row survived the conflict is the purchase of record.
        let stored = self
            .find_by_payment_id(&purchase.payment_id)
            .await?
            .ok_or_else(|| {
                DomainError::database(format!(
                    "Purchase with payment_id {} missing after insert",
                    purchase.payment_id
                ))
            })?;

        if result.rows_affected() == 1 {
            Ok(InsertOutcome::Inserted(stored))
        } else {
            Ok(InsertOutcome::AlreadyRecorded(stored))
        }
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM purchases WHERE payment_id = $1",
            PURCHASE_COLUMNS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find purchase: {}", e)))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn find_active(
        &self,
        user_id: &UserId,
        content_id: &ContentId,
    ) -> Result<Option<Purchase>, DomainError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM purchases
            WHERE user_id = $1 AND content_id = $2 AND is_active = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(user_id.as_str())
        .bind(content_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find active purchase: {}", e)))?;

        row.map(Purchase::try_from).transpose()
    }

    async fn deactivate(&self, id: &PurchaseId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE purchases SET is_active = FALSE WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to deactivate purchase: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<Purchase>, DomainError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM purchases
            WHERE user_id = $1 AND is_active = TRUE
            ORDER BY created_at DESC
            "#,
            PURCHASE_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to list purchases: {}", e)))?;

        rows.into_iter().map(Purchase::try_from).collect()
    }
}
