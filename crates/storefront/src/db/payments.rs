//! Payment repository: recording a charge and placing the order.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as, query_scalar};

use corner_shop_core::{OrderId, OrderItemId, PaymentId};

use super::orders::ORDER_COLUMNS;
use super::{PgRepository, RepositoryError};
use crate::models::{NewPayment, Order, Payment};

const PAYMENT_COLUMNS: &str = "id, charge_id, user_id, amount, created_at";

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Record a successful charge and place the order.
    ///
    /// In one transaction, with the order row locked: inserts the payment,
    /// marks the lines in `payment.lines` as ordered, detaches any other
    /// unordered line from the order so it rolls into the next cart, and
    /// flips the order to `ordered` with the payment and reference code
    /// attached.
    ///
    /// Returns `RepositoryError::Conflict` if the order was already placed
    /// or if a charged line is no longer linked at the charged quantity.
    async fn place_order(
        &self,
        order: OrderId,
        payment: NewPayment,
        ref_code: &str,
    ) -> Result<Order, RepositoryError>;

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError>;
}

impl<'r> FromRow<'r, PgRow> for Payment {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            charge_id: row.try_get("charge_id")?,
            user_id: row.try_get("user_id")?,
            amount: row.try_get("amount")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl PaymentRepository for PgRepository {
    async fn place_order(
        &self,
        order: OrderId,
        payment: NewPayment,
        ref_code: &str,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let locked: Option<bool> =
            query_scalar("SELECT ordered FROM shop.orders WHERE id = $1 FOR UPDATE")
                .bind(order)
                .fetch_optional(&mut *tx)
                .await?;
        match locked {
            None => return Err(RepositoryError::NotFound),
            Some(true) => {
                return Err(RepositoryError::Conflict(format!(
                    "order {order} already placed"
                )));
            }
            Some(false) => {}
        }

        let linked = query_as::<Postgres, (OrderItemId, i32)>(
            "SELECT id, quantity FROM shop.order_items \
             WHERE order_id = $1 AND NOT ordered FOR UPDATE",
        )
        .bind(order)
        .fetch_all(&mut *tx)
        .await?;
        let unchanged = payment.lines.iter().all(|charged| {
            linked.iter().any(|(id, quantity)| {
                *id == charged.order_item && i64::from(*quantity) == i64::from(charged.quantity)
            })
        });
        if !unchanged {
            return Err(RepositoryError::Conflict(format!(
                "order {order} changed while the card was charged"
            )));
        }

        let sql = format!(
            "INSERT INTO shop.payments (charge_id, user_id, amount) \
             VALUES ($1, $2, $3) RETURNING {PAYMENT_COLUMNS}"
        );
        let saved = query_as::<Postgres, Payment>(&sql)
            .bind(&payment.charge_id)
            .bind(payment.user_id)
            .bind(payment.amount)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "payment charge"))?;

        let charged: Vec<i32> = payment
            .lines
            .iter()
            .map(|line| line.order_item.as_i32())
            .collect();
        query("UPDATE shop.order_items SET ordered = TRUE WHERE order_id = $1 AND id = ANY($2)")
            .bind(order)
            .bind(&charged)
            .execute(&mut *tx)
            .await?;
        query("UPDATE shop.order_items SET order_id = NULL WHERE order_id = $1 AND NOT ordered")
            .bind(order)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "UPDATE shop.orders SET ordered = TRUE, payment_id = $1, ref_code = $2 \
             WHERE id = $3 AND NOT ordered RETURNING {ORDER_COLUMNS}"
        );
        let placed = query_as::<Postgres, Order>(&sql)
            .bind(saved.id)
            .bind(ref_code)
            .bind(order)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "order reference code"))?
            .ok_or_else(|| RepositoryError::Conflict(format!("order {order} already placed")))?;

        tx.commit().await?;
        Ok(placed)
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM shop.payments WHERE id = $1");
        let payment = query_as::<Postgres, Payment>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(payment)
    }
}
