// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write/read port over the authoritative order store.

use async_trait::async_trait;

use crate::error::OstraError;
use crate::types::{NewOrder, OrderSummary, StoreCustomer, ValidatedOrder};

/// Access to the order store.
///
/// The store is the only writer of orders: creation persists the order,
/// its line items, and one history entry in a single transaction, and
/// enforces order-number uniqueness.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Atomically persist a price-validated order.
    ///
    /// An order-number collision surfaces as a storage error so the caller
    /// can regenerate and retry.
    async fn create_order(&self, order: &NewOrder) -> Result<ValidatedOrder, OstraError>;

    /// Recent orders by order number or by the phone of a known store
    /// customer, newest first. An unmatched phone yields an empty list.
    async fn find_orders(
        &self,
        phone: Option<&str>,
        order_number: Option<&str>,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, OstraError>;

    /// Look up a storefront customer record by phone.
    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<StoreCustomer>, OstraError>;
}
