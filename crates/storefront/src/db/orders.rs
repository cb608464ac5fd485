//! Cart and order repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use corner_shop_core::{ItemId, OrderId, OrderItemId, UserId};

use super::{PgRepository, RepositoryError, decode_parsed, decode_quantity};
use crate::models::{Item, Order, OrderItem, OrderLine};

pub(super) const ORDER_COLUMNS: &str = "id, user_id, ordered_date, ordered, ref_code, \
     billing_address_id, coupon_id, payment_id, refund_requested, refund_granted";

const ORDER_ITEM_COLUMNS: &str = "id, user_id, item_id, order_id, ordered, quantity";

/// Reads and writes for carts, cart lines and placed orders.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// The user's unordered order, if one exists.
    async fn get_active_order(&self, user: UserId) -> Result<Option<Order>, RepositoryError>;

    /// The user's unordered order, created with `ordered_date = now` if absent.
    async fn get_or_create_active_order(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError>;

    /// The unordered line for (user, item), created with quantity 1 if absent.
    async fn get_or_create_order_item(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<OrderItem, RepositoryError>;

    /// The line for `item` linked to `order`, if any.
    async fn find_order_item(
        &self,
        order: OrderId,
        item: ItemId,
    ) -> Result<Option<OrderItem>, RepositoryError>;

    /// Link an unordered line to an order that has not been placed.
    async fn link_order_item(
        &self,
        order: OrderId,
        order_item: OrderItemId,
    ) -> Result<(), RepositoryError>;

    /// Delete an unordered line.
    async fn remove_order_item(&self, order_item: OrderItemId) -> Result<(), RepositoryError>;

    /// Add one to an unordered line's quantity.
    async fn increment_quantity(
        &self,
        order_item: OrderItemId,
    ) -> Result<OrderItem, RepositoryError>;

    /// Subtract one from an unordered line whose quantity is above one.
    async fn decrement_quantity(
        &self,
        order_item: OrderItemId,
    ) -> Result<OrderItem, RepositoryError>;

    /// All lines linked to an order, with their catalog items.
    async fn order_lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError>;

    /// Look up a placed order by its reference code.
    async fn get_order_by_ref_code(
        &self,
        ref_code: &str,
    ) -> Result<Option<Order>, RepositoryError>;
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            ordered_date: row.try_get("ordered_date")?,
            ordered: row.try_get("ordered")?,
            ref_code: row.try_get("ref_code")?,
            billing_address_id: row.try_get("billing_address_id")?,
            coupon_id: row.try_get("coupon_id")?,
            payment_id: row.try_get("payment_id")?,
            refund_requested: row.try_get("refund_requested")?,
            refund_granted: row.try_get("refund_granted")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            item_id: row.try_get("item_id")?,
            order_id: row.try_get("order_id")?,
            ordered: row.try_get("ordered")?,
            quantity: decode_quantity(row.try_get("quantity")?, "quantity")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let category: String = row.try_get("category")?;
        let label: String = row.try_get("label")?;
        let item_id: ItemId = row.try_get("item_id")?;

        Ok(Self {
            order_item: OrderItem {
                id: row.try_get("order_item_id")?,
                user_id: row.try_get("user_id")?,
                item_id,
                order_id: row.try_get("order_id")?,
                ordered: row.try_get("ordered")?,
                quantity: decode_quantity(row.try_get("quantity")?, "quantity")?,
            },
            item: Item {
                id: item_id,
                slug: row.try_get("slug")?,
                title: row.try_get("title")?,
                price: row.try_get("price")?,
                category: decode_parsed(&category, "category")?,
                label: decode_parsed(&label, "label")?,
                description: row.try_get("description")?,
            },
        })
    }
}

#[async_trait]
impl OrderRepository for PgRepository {
    async fn get_active_order(&self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM shop.orders WHERE user_id = $1 AND NOT ordered");
        let order = query_as::<Postgres, Order>(&sql)
            .bind(user)
            .fetch_optional(self.pool())
            .await?;
        Ok(order)
    }

    async fn get_or_create_active_order(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        // Concurrent callers race on the partial unique index; the loser's
        // insert is a no-op and both read the same row back.
        query(
            "INSERT INTO shop.orders (user_id, ordered_date) VALUES ($1, $2) \
             ON CONFLICT (user_id) WHERE NOT ordered DO NOTHING",
        )
        .bind(user)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_active_order(user)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_or_create_order_item(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<OrderItem, RepositoryError> {
        query(
            "INSERT INTO shop.order_items (user_id, item_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, item_id) WHERE NOT ordered DO NOTHING",
        )
        .bind(user)
        .bind(item)
        .execute(self.pool())
        .await?;

        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM shop.order_items \
             WHERE user_id = $1 AND item_id = $2 AND NOT ordered"
        );
        let order_item = query_as::<Postgres, OrderItem>(&sql)
            .bind(user)
            .bind(item)
            .fetch_one(self.pool())
            .await?;
        Ok(order_item)
    }

    async fn find_order_item(
        &self,
        order: OrderId,
        item: ItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM shop.order_items WHERE order_id = $1 AND item_id = $2"
        );
        let order_item = query_as::<Postgres, OrderItem>(&sql)
            .bind(order)
            .bind(item)
            .fetch_optional(self.pool())
            .await?;
        Ok(order_item)
    }

    async fn link_order_item(
        &self,
        order: OrderId,
        order_item: OrderItemId,
    ) -> Result<(), RepositoryError> {
        let rows = query(
            "UPDATE shop.order_items SET order_id = $1 WHERE id = $2 AND NOT ordered \
             AND EXISTS (SELECT 1 FROM shop.orders WHERE id = $1 AND NOT ordered FOR SHARE)",
        )
        .bind(order)
        .bind(order_item)
        .execute(self.pool())
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn remove_order_item(&self, order_item: OrderItemId) -> Result<(), RepositoryError> {
        let rows = query("DELETE FROM shop.order_items WHERE id = $1 AND NOT ordered")
            .bind(order_item)
            .execute(self.pool())
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn increment_quantity(
        &self,
        order_item: OrderItemId,
    ) -> Result<OrderItem, RepositoryError> {
        let sql = format!(
            "UPDATE shop.order_items SET quantity = quantity + 1 \
             WHERE id = $1 AND NOT ordered RETURNING {ORDER_ITEM_COLUMNS}"
        );
        query_as::<Postgres, OrderItem>(&sql)
            .bind(order_item)
            .fetch_optional(self.pool())
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn decrement_quantity(
        &self,
        order_item: OrderItemId,
    ) -> Result<OrderItem, RepositoryError> {
        let sql = format!(
            "UPDATE shop.order_items SET quantity = quantity - 1 \
             WHERE id = $1 AND NOT ordered AND quantity > 1 RETURNING {ORDER_ITEM_COLUMNS}"
        );
        query_as::<Postgres, OrderItem>(&sql)
            .bind(order_item)
            .fetch_optional(self.pool())
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn order_lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let lines = query_as::<Postgres, OrderLine>(
            r"
            SELECT oi.id AS order_item_id, oi.user_id, oi.item_id, oi.order_id,
                   oi.ordered, oi.quantity,
                   i.slug, i.title, i.price, i.category, i.label, i.description
            FROM shop.order_items oi
            JOIN shop.items i ON i.id = oi.item_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order)
        .fetch_all(self.pool())
        .await?;
        Ok(lines)
    }

    async fn get_order_by_ref_code(
        &self,
        ref_code: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM shop.orders WHERE ref_code = $1");
        let order = query_as::<Postgres, Order>(&sql)
            .bind(ref_code)
            .fetch_optional(self.pool())
            .await?;
        Ok(order)
    }
}
