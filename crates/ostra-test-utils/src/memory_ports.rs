// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory implementations of the persistence and delivery ports.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use ostra_core::types::{
    Channel, CustomerIdentity, EscalationAlert, NewOrder, OrderStatus, OrderSummary, Product,
    StoreCustomer, Supply, SupplyItem, ValidatedOrder,
};
use ostra_core::{
    ChannelSender, EscalationNotifier, IdentityStore, OrderStore, OstraError, ProductCatalog,
};

/// Catalog backed by a plain vector.
#[derive(Default)]
pub struct MemoryCatalog {
    pub products: Vec<Product>,
    pub supplies: Vec<Supply>,
    pub supply_items: Vec<SupplyItem>,
}

impl MemoryCatalog {
    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ProductCatalog for MemoryCatalog {
    async fn find_by_name_substring(&self, text: &str) -> Result<Vec<Product>, OstraError> {
        let needle = text.to_lowercase();
        Ok(self
            .products
            .iter()
            .filter(|p| p.status.is_orderable() && p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Product>, OstraError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn list_available(
        &self,
        category: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Product>, OstraError> {
        Ok(self
            .products
            .iter()
            .filter(|p| p.status.is_orderable())
            .filter(|p| category.is_none_or(|c| p.category == c))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_upcoming_supplies(&self, limit: i64) -> Result<Vec<Supply>, OstraError> {
        Ok(self
            .supplies
            .iter()
            .filter(|s| s.is_active)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn active_supply_for(
        &self,
        product_id: &str,
    ) -> Result<Option<SupplyItem>, OstraError> {
        Ok(self
            .supply_items
            .iter()
            .find(|item| {
                item.product_id == product_id
                    && self
                        .supplies
                        .iter()
                        .any(|s| s.id == item.supply_id && s.is_active)
            })
            .cloned())
    }
}

/// Order store that records created orders in memory.
#[derive(Default)]
pub struct MemoryOrderStore {
    pub created: Mutex<Vec<ValidatedOrder>>,
    pub clients: Mutex<Vec<StoreCustomer>>,
}

impl MemoryOrderStore {
    pub fn created_orders(&self) -> Vec<ValidatedOrder> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create_order(&self, order: &NewOrder) -> Result<ValidatedOrder, OstraError> {
        let mut created = self.created.lock().unwrap();
        if created.iter().any(|o| o.order_number == order.order_number) {
            return Err(OstraError::Storage {
                source: "UNIQUE constraint failed: orders.order_number".into(),
            });
        }
        let validated = ValidatedOrder {
            id: Uuid::new_v4().to_string(),
            order_number: order.order_number.clone(),
            items: order.items.clone(),
            total_amount: order.total_amount,
            status: OrderStatus::New,
            delivery_date: order.delivery_date.clone(),
            slot: order.slot,
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        };
        created.push(validated.clone());
        Ok(validated)
    }

    async fn find_orders(
        &self,
        phone: Option<&str>,
        order_number: Option<&str>,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, OstraError> {
        let created = self.created.lock().unwrap();
        let mut hits: Vec<OrderSummary> = created
            .iter()
            .filter(|o| order_number.is_none_or(|n| o.order_number == n))
            .map(|o| OrderSummary {
                order_number: o.order_number.clone(),
                status: o.status,
                total_amount: o.total_amount,
                delivery_date: o.delivery_date.clone(),
                created_at: o.created_at.clone(),
            })
            .collect();
        // Phone filtering needs a client link; the in-memory store treats
        // any known client phone as matching all orders.
        if order_number.is_none() {
            let known = phone
                .map(|p| self.clients.lock().unwrap().iter().any(|c| c.phone == p))
                .unwrap_or(false);
            if !known {
                hits.clear();
            }
        }
        hits.reverse();
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn find_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<StoreCustomer>, OstraError> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.phone == phone)
            .cloned())
    }
}

/// Identity store over a vector, mirroring the SQLite adapter's contract.
#[derive(Default)]
pub struct MemoryIdentityStore {
    pub rows: Mutex<Vec<CustomerIdentity>>,
    pub clients: Mutex<Vec<StoreCustomer>>,
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_identity(
        &self,
        channel: Channel,
        external_id: &str,
    ) -> Result<Option<CustomerIdentity>, OstraError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.channel == channel && r.external_id == external_id)
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<CustomerIdentity>, OstraError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerIdentity>, OstraError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.email.as_deref() == Some(email))
            .cloned())
    }

    async fn insert_identity(&self, identity: &CustomerIdentity) -> Result<(), OstraError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.channel == identity.channel && r.external_id == identity.external_id)
        {
            return Err(OstraError::Storage {
                source: "UNIQUE constraint failed: customer_identities".into(),
            });
        }
        rows.push(identity.clone());
        Ok(())
    }

    async fn link_phone(&self, unified_id: &str, phone: &str) -> Result<(), OstraError> {
        for row in self.rows.lock().unwrap().iter_mut() {
            if row.unified_id == unified_id && row.phone.is_none() {
                row.phone = Some(phone.to_string());
            }
        }
        Ok(())
    }

    async fn find_store_customer_by_phone(
        &self,
        phone: &str,
    ) -> Result<Option<StoreCustomer>, OstraError> {
        Ok(self
            .clients
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.phone == phone)
            .cloned())
    }
}

/// Records escalation alerts instead of posting them.
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<EscalationAlert>>,
    /// When set, every alert attempt fails. Escalation must still succeed.
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

#[async_trait]
impl EscalationNotifier for RecordingNotifier {
    async fn alert(&self, alert: &EscalationAlert) -> Result<(), OstraError> {
        if self.fail {
            return Err(OstraError::Channel {
                message: "notifier unavailable".to_string(),
                source: None,
            });
        }
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

/// Captures outbound deliveries.
#[derive(Default)]
pub struct RecordingSender {
    pub deliveries: Mutex<Vec<(Channel, String, String)>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(Channel, String, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    async fn deliver(
        &self,
        channel: Channel,
        external_id: &str,
        text: &str,
    ) -> Result<(), OstraError> {
        self.deliveries.lock().unwrap().push((
            channel,
            external_id.to_string(),
            text.to_string(),
        ));
        Ok(())
    }
}

/// A small seafood catalog used across tests.
pub fn sample_products() -> Vec<Product> {
    use ostra_core::types::ProductStatus;
    vec![
        Product {
            id: "prod_oyster".to_string(),
            name: "Устрицы Хасанские".to_string(),
            category: "oysters".to_string(),
            price: Decimal::new(45000, 2),
            unit: "шт".to_string(),
            status: ProductStatus::Available,
            short_description: Some("Свежие устрицы".to_string()),
            display_order: 1,
        },
        Product {
            id: "prod_shrimp".to_string(),
            name: "Креветки магаданские".to_string(),
            category: "shrimp".to_string(),
            price: Decimal::new(120000, 2),
            unit: "кг".to_string(),
            status: ProductStatus::Preorder,
            short_description: None,
            display_order: 2,
        },
        Product {
            id: "prod_crab".to_string(),
            name: "Краб камчатский".to_string(),
            category: "crab".to_string(),
            price: Decimal::new(350000, 2),
            unit: "кг".to_string(),
            status: ProductStatus::Hidden,
            short_description: None,
            display_order: 3,
        },
    ]
}
