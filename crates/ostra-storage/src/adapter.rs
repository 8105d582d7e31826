// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the catalog, order store, and identity ports.

use async_trait::async_trait;
use tracing::debug;

use ostra_config::model::StorageConfig;
use ostra_core::types::{
    Channel, CustomerIdentity, NewOrder, OrderSummary, Product, StoreCustomer, Supply,
    SupplyItem, ValidatedOrder,
};
use ostra_core::{IdentityStore, OrderStore, OstraError, ProductCatalog};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage. Cloning shares the underlying writer thread.
///
/// Implements all three persistence ports; queue access goes through
/// [`SqliteStorage::database`] and the `queries::queue` module, since the
/// queue is owned by this crate rather than exposed as a port.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Open the configured database, running migrations if needed.
    pub async fn open(config: &StorageConfig) -> Result<Self, OstraError> {
        let db = Database::open(&config.database_path).await?;
        debug!(path = %config.database_path, "SQLite storage initialized");
        Ok(Self { db })
    }

    /// Wrap an already-open database. Used by tests sharing one handle.
    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoint the WAL and release the writer thread.
    pub async fn close(self) -> Result<(), OstraError> {
        self.db.close().await
    }
}

#[async_trait]
impl ProductCatalog for SqliteStorage {
    async fn find_by_name_substring(&self, text: &str) -> Result<Vec<Product>, OstraError> {
        queries::catalog::find_by_name_substring(&self.db, text).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, OstraError> {
        queries::catalog::get_by_id(&self.db, id).await
    }

    async fn list_available(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Product>, OstraError> {
        queries::catalog::list_available(&self.db, category, limit).await
    }

    async fn list_upcoming_supplies(&self, limit: i64) -> Result<Vec<Supply>, OstraError> {
        queries::catalog::list_upcoming_supplies(&self.db, limit).await
    }

    async fn active_supply_for(
        &self,
        product_id: &str,
    ) -> Result<Option<SupplyItem>, OstraError> {
        queries::catalog::active_supply_for(&self.db, product_id).await
    }
}

#[async_trait]
impl OrderStore for SqliteStorage {
    async fn create_order(&self, order: &NewOrder) -> Result<ValidatedOrder, OstraError> {
        // Bind the order to a storefront user when the checkout phone
        // matches a known client, so phone lookups can find it later.
        let user_id = match &order.phone {
            Some(phone) => queries::identities::find_client_by_phone(&self.db, phone)
                .await?
                .and_then(|client| client.user_id),
            None => None,
        };
        queries::orders::create(&self.db, order, user_id.as_deref()).await
    }

    async fn find_orders(
        &self,
        phone: Option<&str>,
        order_number: Option<&str>,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, OstraError> {
        if let Some(number) = order_number {
            let hit = queries::orders::find_by_number(&self.db, number).await?;
            return Ok(hit.into_iter().collect());
        }
        if let Some(phone) = phone {
            let Some(client) = queries::identities::find_client_by_phone(&self.db, phone).await?
            else {
                return Ok(Vec::new());
            };
            let Some(user_id) = client.user_id else {
                return Ok(Vec::new());
            };
            return queries::orders::find_by_user(&self.db, &user_id, limit).await;
        }
        Ok(Vec::new())
    }

    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<StoreCustomer>, OstraError> {
        queries::identities::find_client_by_phone(&self.db, phone).await
    }
}

#[async_trait]
impl IdentityStore for SqliteStorage {
    async fn find_identity(
        &self,
        channel: Channel,
        external_id: &str,
    ) -> Result<Option<CustomerIdentity>, OstraError> {
        queries::identities::find_by_channel(&self.db, channel, external_id).await
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<CustomerIdentity>, OstraError> {
        queries::identities::find_by_phone(&self.db, phone).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerIdentity>, OstraError> {
        queries::identities::find_by_email(&self.db, email).await
    }

    async fn insert_identity(&self, identity: &CustomerIdentity) -> Result<(), OstraError> {
        queries::identities::insert(&self.db, identity).await
    }

    async fn link_phone(&self, unified_id: &str, phone: &str) -> Result<(), OstraError> {
        queries::identities::link_phone(&self.db, unified_id, phone).await
    }

    async fn find_store_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<StoreCustomer>, OstraError> {
        queries::identities::find_client_by_phone(&self.db, phone).await
    }
}
