//! In-process repository.
//!
//! Mirrors the `PostgreSQL` schema closely enough to run the services and
//! routes without a database: ids are assigned sequentially per table, and
//! the unique constraints (item slug, coupon code, user email, one active
//! cart per user, one unordered line per user and item) are enforced the
//! same way.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use corner_shop_core::{
    AddressId, CouponId, Email, ItemId, OrderId, OrderItemId, PaymentId, RefundId, Slug, UserId,
};

use super::{
    CheckoutRepository, ItemRepository, OrderRepository, PaymentRepository, RefundRepository,
    Repository, RepositoryError, UserRepository,
};
use crate::models::{
    BillingAddress, Coupon, Item, NewBillingAddress, NewCoupon, NewItem, NewPayment, NewRefund,
    Order, OrderItem, OrderLine, Payment, Refund, User,
};

#[derive(Debug, Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<UserId, User>,
    items: BTreeMap<ItemId, Item>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    addresses: BTreeMap<AddressId, BillingAddress>,
    coupons: BTreeMap<CouponId, Coupon>,
    payments: BTreeMap<PaymentId, Payment>,
    refunds: BTreeMap<RefundId, Refund>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn active_order(&self, user: UserId) -> Option<&Order> {
        self.orders
            .values()
            .find(|order| order.user_id == user && !order.ordered)
    }

    fn unordered_line_mut(&mut self, id: OrderItemId) -> Result<&mut OrderItem, RepositoryError> {
        self.order_items
            .get_mut(&id)
            .filter(|line| !line.ordered)
            .ok_or(RepositoryError::NotFound)
    }
}

/// Repository backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: Mutex<Tables>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::DataCorruption("repository lock poisoned".to_owned()))
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl ItemRepository for MemoryRepository {
    async fn list_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let tables = self.lock()?;
        let mut items: Vec<Item> = tables.items.values().cloned().collect();
        items.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_item_by_slug(&self, slug: &Slug) -> Result<Option<Item>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.items.values().find(|item| &item.slug == slug).cloned())
    }

    async fn create_item(&self, item: NewItem) -> Result<Item, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.items.values().any(|existing| existing.slug == item.slug) {
            return Err(RepositoryError::Conflict("item slug already exists".to_owned()));
        }
        let id = ItemId::new(tables.next_id());
        let created = Item {
            id,
            slug: item.slug,
            title: item.title,
            price: item.price,
            category: item.category,
            label: item.label,
            description: item.description,
        };
        tables.items.insert(id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl OrderRepository for MemoryRepository {
    async fn get_active_order(&self, user: UserId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock()?.active_order(user).cloned())
    }

    async fn get_or_create_active_order(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut tables = self.lock()?;
        if let Some(order) = tables.active_order(user) {
            return Ok(order.clone());
        }
        let id = OrderId::new(tables.next_id());
        let order = Order {
            id,
            user_id: user,
            ordered_date: now,
            ordered: false,
            ref_code: None,
            billing_address_id: None,
            coupon_id: None,
            payment_id: None,
            refund_requested: false,
            refund_granted: false,
        };
        tables.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get_or_create_order_item(
        &self,
        user: UserId,
        item: ItemId,
    ) -> Result<OrderItem, RepositoryError> {
        let mut tables = self.lock()?;
        if let Some(line) = tables
            .order_items
            .values()
            .find(|line| line.user_id == user && line.item_id == item && !line.ordered)
        {
            return Ok(line.clone());
        }
        if !tables.items.contains_key(&item) {
            return Err(RepositoryError::NotFound);
        }
        let id = OrderItemId::new(tables.next_id());
        let line = OrderItem {
            id,
            user_id: user,
            item_id: item,
            order_id: None,
            ordered: false,
            quantity: 1,
        };
        tables.order_items.insert(id, line.clone());
        Ok(line)
    }

    async fn find_order_item(
        &self,
        order: OrderId,
        item: ItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .order_items
            .values()
            .find(|line| line.order_id == Some(order) && line.item_id == item)
            .cloned())
    }

    async fn link_order_item(
        &self,
        order: OrderId,
        order_item: OrderItemId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.orders.get(&order).is_none_or(|o| o.ordered) {
            return Err(RepositoryError::NotFound);
        }
        tables.unordered_line_mut(order_item)?.order_id = Some(order);
        Ok(())
    }

    async fn remove_order_item(&self, order_item: OrderItemId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        tables.unordered_line_mut(order_item)?;
        tables.order_items.remove(&order_item);
        Ok(())
    }

    async fn increment_quantity(
        &self,
        order_item: OrderItemId,
    ) -> Result<OrderItem, RepositoryError> {
        let mut tables = self.lock()?;
        let line = tables.unordered_line_mut(order_item)?;
        line.quantity += 1;
        Ok(line.clone())
    }

    async fn decrement_quantity(
        &self,
        order_item: OrderItemId,
    ) -> Result<OrderItem, RepositoryError> {
        let mut tables = self.lock()?;
        let line = tables.unordered_line_mut(order_item)?;
        if line.quantity <= 1 {
            return Err(RepositoryError::NotFound);
        }
        line.quantity -= 1;
        Ok(line.clone())
    }

    async fn order_lines(&self, order: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let tables = self.lock()?;
        tables
            .order_items
            .values()
            .filter(|line| line.order_id == Some(order))
            .map(|line| {
                let item = tables.items.get(&line.item_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "order item {} references missing item {}",
                        line.id, line.item_id
                    ))
                })?;
                Ok(OrderLine {
                    order_item: line.clone(),
                    item,
                })
            })
            .collect()
    }

    async fn get_order_by_ref_code(
        &self,
        ref_code: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .orders
            .values()
            .find(|order| order.ref_code.as_deref() == Some(ref_code))
            .cloned())
    }
}

#[async_trait]
impl CheckoutRepository for MemoryRepository {
    async fn add_billing_address(
        &self,
        order: OrderId,
        address: NewBillingAddress,
    ) -> Result<BillingAddress, RepositoryError> {
        let mut tables = self.lock()?;
        let owned_and_open = tables
            .orders
            .get(&order)
            .is_some_and(|o| o.user_id == address.user_id && !o.ordered);
        if !owned_and_open {
            return Err(RepositoryError::NotFound);
        }

        let id = AddressId::new(tables.next_id());
        let saved = BillingAddress {
            id,
            user_id: address.user_id,
            street_address: address.street_address,
            apartment_address: address.apartment_address,
            country: address.country,
            zip: address.zip,
        };
        tables.addresses.insert(id, saved.clone());
        if let Some(o) = tables.orders.get_mut(&order) {
            o.billing_address_id = Some(id);
        }
        Ok(saved)
    }

    async fn get_billing_address(
        &self,
        id: AddressId,
    ) -> Result<Option<BillingAddress>, RepositoryError> {
        Ok(self.lock()?.addresses.get(&id).cloned())
    }

    async fn get_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables.coupons.values().find(|c| c.code == code).cloned())
    }

    async fn get_coupon(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self.lock()?.coupons.get(&id).cloned())
    }

    async fn create_coupon(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.coupons.values().any(|c| c.code == coupon.code) {
            return Err(RepositoryError::Conflict("coupon code already exists".to_owned()));
        }
        let id = CouponId::new(tables.next_id());
        let created = Coupon {
            id,
            code: coupon.code,
            amount: coupon.amount,
        };
        tables.coupons.insert(id, created.clone());
        Ok(created)
    }

    async fn attach_coupon(
        &self,
        order: OrderId,
        coupon: CouponId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let order = tables
            .orders
            .get_mut(&order)
            .filter(|o| !o.ordered)
            .ok_or(RepositoryError::NotFound)?;
        order.coupon_id = Some(coupon);
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository for MemoryRepository {
    async fn place_order(
        &self,
        order: OrderId,
        payment: NewPayment,
        ref_code: &str,
    ) -> Result<Order, RepositoryError> {
        let mut tables = self.lock()?;
        match tables.orders.get(&order) {
            None => return Err(RepositoryError::NotFound),
            Some(o) if o.ordered => {
                return Err(RepositoryError::Conflict(format!(
                    "order {order} already placed"
                )));
            }
            Some(_) => {}
        }
        let unchanged = payment.lines.iter().all(|charged| {
            tables.order_items.get(&charged.order_item).is_some_and(|line| {
                line.order_id == Some(order)
                    && !line.ordered
                    && line.quantity == charged.quantity
            })
        });
        if !unchanged {
            return Err(RepositoryError::Conflict(format!(
                "order {order} changed while the card was charged"
            )));
        }
        if tables
            .orders
            .values()
            .any(|o| o.ref_code.as_deref() == Some(ref_code))
        {
            return Err(RepositoryError::Conflict(
                "order reference code already exists".to_owned(),
            ));
        }

        let id = PaymentId::new(tables.next_id());
        tables.payments.insert(
            id,
            Payment {
                id,
                charge_id: payment.charge_id,
                user_id: payment.user_id,
                amount: payment.amount,
                created_at: Utc::now(),
            },
        );

        for line in tables.order_items.values_mut() {
            if line.order_id != Some(order) || line.ordered {
                continue;
            }
            if payment.lines.iter().any(|c| c.order_item == line.id) {
                line.ordered = true;
            } else {
                line.order_id = None;
            }
        }

        let placed = tables
            .orders
            .get_mut(&order)
            .ok_or(RepositoryError::NotFound)?;
        placed.ordered = true;
        placed.payment_id = Some(id);
        placed.ref_code = Some(ref_code.to_owned());
        Ok(placed.clone())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        Ok(self.lock()?.payments.get(&id).cloned())
    }
}

#[async_trait]
impl RefundRepository for MemoryRepository {
    async fn request_refund(
        &self,
        order: OrderId,
        refund: NewRefund,
    ) -> Result<Refund, RepositoryError> {
        let mut tables = self.lock()?;
        let placed = tables
            .orders
            .get_mut(&order)
            .filter(|o| o.ordered)
            .ok_or(RepositoryError::NotFound)?;
        placed.refund_requested = true;

        let id = RefundId::new(tables.next_id());
        let saved = Refund {
            id,
            order_id: order,
            reason: refund.reason,
            email: refund.email,
            accepted: false,
            created_at: Utc::now(),
        };
        tables.refunds.insert(id, saved.clone());
        Ok(saved)
    }

    async fn grant_refunds(&self, ref_codes: &[String]) -> Result<u64, RepositoryError> {
        let mut tables = self.lock()?;
        let mut granted = Vec::new();
        for order in tables.orders.values_mut() {
            let matches = order
                .ref_code
                .as_ref()
                .is_some_and(|code| ref_codes.contains(code));
            if order.ordered && matches {
                order.refund_granted = true;
                order.refund_requested = false;
                granted.push(order.id);
            }
        }
        for refund in tables.refunds.values_mut() {
            if granted.contains(&refund.order_id) {
                refund.accepted = true;
            }
        }
        Ok(u64::try_from(granted.len()).unwrap_or(u64::MAX))
    }

    async fn refunds_for_order(&self, order: OrderId) -> Result<Vec<Refund>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .refunds
            .values()
            .filter(|r| r.order_id == order)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create_user(&self, email: &Email) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let id = UserId::new(tables.next_id());
        let user = User {
            id,
            email: email.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }
}
