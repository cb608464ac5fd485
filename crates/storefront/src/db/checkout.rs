//! Billing address and coupon repository.

use async_trait::async_trait;
use sqlx::{FromRow, Postgres, Row, postgres::PgRow, query, query_as};

use corner_shop_core::{AddressId, CouponId, OrderId};

use super::{PgRepository, RepositoryError};
use crate::models::{BillingAddress, Coupon, NewBillingAddress, NewCoupon};

const ADDRESS_COLUMNS: &str = "id, user_id, street_address, apartment_address, country, zip";
const COUPON_COLUMNS: &str = "id, code, amount";

#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    /// Save a billing address and attach it to `order` in one transaction.
    ///
    /// Returns `RepositoryError::NotFound` if the order is missing or already
    /// placed.
    async fn add_billing_address(
        &self,
        order: OrderId,
        address: NewBillingAddress,
    ) -> Result<BillingAddress, RepositoryError>;

    async fn get_billing_address(
        &self,
        id: AddressId,
    ) -> Result<Option<BillingAddress>, RepositoryError>;

    /// Look up a coupon by its exact code.
    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError>;

    async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError>;

    /// Returns `RepositoryError::Conflict` if the code is taken.
    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError>;

    /// Set (or replace) the coupon on an unplaced order.
    async fn attach_coupon(&self, order: OrderId, coupon: CouponId)
    -> Result<(), RepositoryError>;
}

impl<'r> FromRow<'r, PgRow> for BillingAddress {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            street_address: row.try_get("street_address")?,
            apartment_address: row.try_get("apartment_address")?,
            country: row.try_get("country")?,
            zip: row.try_get("zip")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Coupon {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            amount: row.try_get("amount")?,
        })
    }
}

#[async_trait]
impl CheckoutRepository for PgRepository {
    async fn add_billing_address(
        &self,
        order: OrderId,
        address: NewBillingAddress,
    ) -> Result<BillingAddress, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let sql = format!(
            "INSERT INTO shop.billing_addresses \
             (user_id, street_address, apartment_address, country, zip) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {ADDRESS_COLUMNS}"
        );
        let saved = query_as::<Postgres, BillingAddress>(&sql)
            .bind(address.user_id)
            .bind(&address.street_address)
            .bind(&address.apartment_address)
            .bind(&address.country)
            .bind(&address.zip)
            .fetch_one(&mut *tx)
            .await?;

        let rows = query(
            "UPDATE shop.orders SET billing_address_id = $1 \
             WHERE id = $2 AND user_id = $3 AND NOT ordered",
        )
        .bind(saved.id)
        .bind(order)
        .bind(address.user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(saved)
    }

    async fn get_billing_address(
        &self,
        id: AddressId,
    ) -> Result<Option<BillingAddress>, RepositoryError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM shop.billing_addresses WHERE id = $1");
        let address = query_as::<Postgres, BillingAddress>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(address)
    }

    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM shop.coupons WHERE code = $1");
        let coupon = query_as::<Postgres, Coupon>(&sql)
            .bind(code)
            .fetch_optional(self.pool())
            .await?;
        Ok(coupon)
    }

    async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let sql = format!("SELECT {COUPON_COLUMNS} FROM shop.coupons WHERE id = $1");
        let coupon = query_as::<Postgres, Coupon>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(coupon)
    }

    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError> {
        let sql = format!(
            "INSERT INTO shop.coupons (code, amount) VALUES ($1, $2) RETURNING {COUPON_COLUMNS}"
        );
        query_as::<Postgres, Coupon>(&sql)
            .bind(&coupon.code)
            .bind(coupon.amount)
            .fetch_one(self.pool())
            .await
            .map_err(|e| RepositoryError::from_insert(e, "coupon code"))
    }

    async fn attach_coupon(
        &self,
        order: OrderId,
        coupon: CouponId,
    ) -> Result<(), RepositoryError> {
        let rows = query("UPDATE shop.orders SET coupon_id = $1 WHERE id = $2 AND NOT ordered")
            .bind(coupon)
            .bind(order)
            .execute(self.pool())
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
