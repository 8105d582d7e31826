// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only port over the authoritative product catalog.

use async_trait::async_trait;

use crate::error::OstraError;
use crate::types::{Product, Supply, SupplyItem};

/// Read access to products and supply windows.
///
/// This port is the only sanctioned price source: order totals are always
/// recomputed through it, never taken from conversation state.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Case-insensitive substring match over orderable products, best
    /// matches first.
    async fn find_by_name_substring(&self, text: &str) -> Result<Vec<Product>, OstraError>;

    /// Fetch a product by exact id, regardless of status.
    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, OstraError>;

    /// List orderable products, optionally filtered by category.
    async fn list_available(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Product>, OstraError>;

    /// Upcoming active supply windows, soonest first.
    async fn list_upcoming_supplies(&self, limit: i64) -> Result<Vec<Supply>, OstraError>;

    /// The product's line in the currently active supply, if any.
    async fn active_supply_for(&self, product_id: &str)
    -> Result<Option<SupplyItem>, OstraError>;
}
