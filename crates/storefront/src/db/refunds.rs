//! Refund repository.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use corner_shop_core::OrderId;

use super::{PgRepository, RepositoryError};
use crate::models::{NewRefund, Refund};

const REFUND_COLUMNS: &str = "id, order_id, reason, email, accepted, created_at";

#[async_trait]
pub trait RefundRepository: Send + Sync {
    /// Flag a placed order as refund-requested and store the request.
    ///
    /// Repeated requests for the same order each store a new refund row.
    async fn request_refund(
        &self,
        order: OrderId,
        refund: NewRefund,
    ) -> Result<Refund, RepositoryError>;

    /// Grant refunds for the orders with the given reference codes.
    ///
    /// Sets `refund_granted`, clears `refund_requested` and accepts every
    /// pending refund row of each matched order. Returns the number of orders
    /// updated. Unknown codes are skipped.
    async fn grant_refunds(&self, ref_codes: &[String]) -> Result<u64, RepositoryError>;

    /// Refund rows for an order, oldest first.
    async fn refunds_for_order(&self, order: OrderId) -> Result<Vec<Refund>, RepositoryError>;
}

impl<'r> FromRow<'r, PgRow> for Refund {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            reason: row.try_get("reason")?,
            email: row.try_get("email")?,
            accepted: row.try_get("accepted")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RefundRepository for PgRepository {
    async fn request_refund(
        &self,
        order: OrderId,
        refund: NewRefund,
    ) -> Result<Refund, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let rows = query("UPDATE shop.orders SET refund_requested = TRUE WHERE id = $1 AND ordered")
            .bind(order)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!(
            "INSERT INTO shop.refunds (order_id, reason, email) \
             VALUES ($1, $2, $3) RETURNING {REFUND_COLUMNS}"
        );
        let saved = query_as::<Postgres, Refund>(&sql)
            .bind(order)
            .bind(&refund.reason)
            .bind(&refund.email)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(saved)
    }

    async fn grant_refunds(&self, ref_codes: &[String]) -> Result<u64, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let updated = query(
            "UPDATE shop.orders SET refund_granted = TRUE, refund_requested = FALSE \
             WHERE ordered AND ref_code = ANY($1)",
        )
        .bind(ref_codes)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        query(
            "UPDATE shop.refunds r SET accepted = TRUE \
             FROM shop.orders o \
             WHERE r.order_id = o.id AND o.ref_code = ANY($1) AND NOT r.accepted",
        )
        .bind(ref_codes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn refunds_for_order(&self, order: OrderId) -> Result<Vec<Refund>, RepositoryError> {
        let sql = format!(
            "SELECT {REFUND_COLUMNS} FROM shop.refunds WHERE order_id = $1 ORDER BY created_at, id"
        );
        let refunds = query_as::<Postgres, Refund>(&sql)
            .bind(order)
            .fetch_all(self.pool())
            .await?;
        Ok(refunds)
    }
}
