// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port over the customer identity table.

use async_trait::async_trait;

use crate::error::OstraError;
use crate::types::{Channel, CustomerIdentity, StoreCustomer};

/// CRUD access to identity rows. Rows are append-mostly: only `phone` and
/// `email` may be back-filled after creation.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Exact lookup by the unique (channel, external_id) pair.
    async fn find_identity(
        &self,
        channel: Channel,
        external_id: &str,
    ) -> Result<Option<CustomerIdentity>, OstraError>;

    /// Best-effort merge lookup by phone, across any channel.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<CustomerIdentity>, OstraError>;

    /// Best-effort merge lookup by email, across any channel.
    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerIdentity>, OstraError>;

    /// Insert a new identity row.
    async fn insert_identity(&self, identity: &CustomerIdentity) -> Result<(), OstraError>;

    /// Back-fill a phone onto all rows of a unified id that lack one.
    async fn link_phone(&self, unified_id: &str, phone: &str) -> Result<(), OstraError>;

    /// Look up a pre-existing storefront customer record by phone.
    async fn find_store_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<StoreCustomer>, OstraError>;
}
