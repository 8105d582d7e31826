// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-first identity resolution across channels.
//!
//! Resolution order: cache, exact (channel, external_id) row, phone merge,
//! email merge, pre-existing storefront client, fresh unified id. Every
//! miss below the cache ends by writing an identity row for the pair, so
//! resolving the same pair twice always yields the same unified id.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use ostra_core::types::{Channel, CustomerIdentity};
use ostra_core::{IdentityStore, OstraError};

use crate::cache::IdentityCache;

/// Outcome of a resolution: the stable cross-channel customer id plus the
/// best-known contact phone.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCustomer {
    pub unified_id: String,
    pub phone: Option<String>,
}

pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
    cache: IdentityCache,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            cache: IdentityCache::default(),
        }
    }

    pub fn with_ttl(store: Arc<dyn IdentityStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: IdentityCache::new(ttl),
        }
    }

    /// Resolve a channel-scoped sender to a unified customer id.
    ///
    /// `phone` and `email` are optional merge hints carried in message
    /// metadata. A phone observed for an already-known identity is
    /// back-filled onto its rows.
    pub async fn resolve(
        &self,
        channel: Channel,
        external_id: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<ResolvedCustomer, OstraError> {
        if let Some((unified_id, cached_phone)) = self.cache.get(channel, external_id) {
            if let (Some(phone), None) = (phone, cached_phone.as_deref()) {
                self.store.link_phone(&unified_id, phone).await?;
                self.cache.insert(channel, external_id, &unified_id, Some(phone));
                return Ok(ResolvedCustomer {
                    unified_id,
                    phone: Some(phone.to_string()),
                });
            }
            return Ok(ResolvedCustomer {
                unified_id,
                phone: cached_phone,
            });
        }

        if let Some(row) = self.store.find_identity(channel, external_id).await? {
            let phone = match (phone, row.phone.as_deref()) {
                (Some(observed), None) => {
                    self.store.link_phone(&row.unified_id, observed).await?;
                    Some(observed.to_string())
                }
                _ => row.phone.clone(),
            };
            self.cache
                .insert(channel, external_id, &row.unified_id, phone.as_deref());
            return Ok(ResolvedCustomer {
                unified_id: row.unified_id,
                phone,
            });
        }

        // Merge by phone: another channel already knows this person.
        if let Some(phone) = phone {
            if let Some(existing) = self.store.find_by_phone(phone).await? {
                return self
                    .adopt(channel, external_id, &existing.unified_id, Some(phone), email)
                    .await;
            }
        }

        // Merge by email.
        if let Some(email) = email {
            if let Some(existing) = self.store.find_by_email(email).await? {
                return self
                    .adopt(channel, external_id, &existing.unified_id, phone, Some(email))
                    .await;
            }
        }

        // Merge with a pre-existing storefront client record.
        if let Some(phone) = phone {
            if let Some(client) = self.store.find_store_customer_by_phone(phone).await? {
                let unified_id = format!("client:{}", client.id);
                return self
                    .adopt(channel, external_id, &unified_id, Some(phone), email)
                    .await;
            }
        }

        // Nobody knows this person yet.
        let unified_id = Uuid::new_v4().to_string();
        debug!(%channel, external_id, unified_id, "new customer identity");
        self.adopt(channel, external_id, &unified_id, phone, email)
            .await
    }

    /// Record the (channel, external_id) pair under a unified id and cache it.
    async fn adopt(
        &self,
        channel: Channel,
        external_id: &str,
        unified_id: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<ResolvedCustomer, OstraError> {
        let row = CustomerIdentity {
            id: Uuid::new_v4().to_string(),
            unified_id: unified_id.to_string(),
            channel,
            external_id: external_id.to_string(),
            phone: phone.map(str::to_string),
            email: email.map(str::to_string),
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        };
        self.store.insert_identity(&row).await?;
        self.cache.insert(channel, external_id, unified_id, phone);
        Ok(ResolvedCustomer {
            unified_id: unified_id.to_string(),
            phone: phone.map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ostra_core::types::StoreCustomer;

    use super::*;

    /// In-memory store counting lookups, so tests can assert cache hits.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<CustomerIdentity>>,
        clients: Mutex<Vec<StoreCustomer>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for MemoryStore {
        async fn find_identity(
            &self,
            channel: Channel,
            external_id: &str,
        ) -> Result<Option<CustomerIdentity>, OstraError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
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
                    source: "UNIQUE constraint failed".into(),
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

    #[tokio::test]
    async fn resolution_is_idempotent_and_cached() {
        let store = Arc::new(MemoryStore::default());
        let resolver = IdentityResolver::new(store.clone());

        let first = resolver
            .resolve(Channel::Telegram, "42", None, None)
            .await
            .unwrap();
        let second = resolver
            .resolve(Channel::Telegram, "42", None, None)
            .await
            .unwrap();
        assert_eq!(first.unified_id, second.unified_id);

        // Second resolution never reached the store.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn phone_merges_channels_into_one_customer() {
        let store = Arc::new(MemoryStore::default());
        let resolver = IdentityResolver::new(store.clone());

        let telegram = resolver
            .resolve(Channel::Telegram, "42", Some("+79990001122"), None)
            .await
            .unwrap();
        let whatsapp = resolver
            .resolve(Channel::Whatsapp, "79990001122", Some("+79990001122"), None)
            .await
            .unwrap();

        assert_eq!(telegram.unified_id, whatsapp.unified_id);
        assert_eq!(store.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn email_merge_when_no_phone_match() {
        let store = Arc::new(MemoryStore::default());
        let resolver = IdentityResolver::new(store.clone());

        let site = resolver
            .resolve(Channel::Site, "sess-1", None, Some("a@b.ru"))
            .await
            .unwrap();
        let instagram = resolver
            .resolve(Channel::Instagram, "insta-9", None, Some("a@b.ru"))
            .await
            .unwrap();

        assert_eq!(site.unified_id, instagram.unified_id);
    }

    #[tokio::test]
    async fn storefront_client_wins_over_fresh_id() {
        let store = Arc::new(MemoryStore::default());
        store.clients.lock().unwrap().push(StoreCustomer {
            id: "c-77".to_string(),
            phone: "+79995556677".to_string(),
            user_id: Some("user-77".to_string()),
            name: None,
        });
        let resolver = IdentityResolver::new(store.clone());

        let resolved = resolver
            .resolve(Channel::Vk, "vk-1", Some("+79995556677"), None)
            .await
            .unwrap();
        assert_eq!(resolved.unified_id, "client:c-77");
    }

    #[tokio::test]
    async fn later_phone_backfills_known_identity() {
        let store = Arc::new(MemoryStore::default());
        let resolver = IdentityResolver::new(store.clone());

        let first = resolver
            .resolve(Channel::Telegram, "42", None, None)
            .await
            .unwrap();
        assert!(first.phone.is_none());

        let second = resolver
            .resolve(Channel::Telegram, "42", Some("+79990001122"), None)
            .await
            .unwrap();
        assert_eq!(second.unified_id, first.unified_id);
        assert_eq!(second.phone.as_deref(), Some("+79990001122"));

        let rows = store.rows.lock().unwrap();
        assert_eq!(rows[0].phone.as_deref(), Some("+79990001122"));
    }
}
