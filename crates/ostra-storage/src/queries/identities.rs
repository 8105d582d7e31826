// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer identity rows and storefront client lookups.

use std::str::FromStr;

use ostra_core::types::{Channel, CustomerIdentity, StoreCustomer};
use ostra_core::OstraError;
use rusqlite::params;

use crate::database::Database;

fn row_to_identity(row: &rusqlite::Row<'_>) -> Result<CustomerIdentity, rusqlite::Error> {
    let channel_token: String = row.get(2)?;
    let channel = Channel::from_str(&channel_token).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(CustomerIdentity {
        id: row.get(0)?,
        unified_id: row.get(1)?,
        channel,
        external_id: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const IDENTITY_COLUMNS: &str =
    "id, unified_id, channel, external_id, phone, email, created_at";

pub async fn find_by_channel(
    db: &Database,
    channel: Channel,
    external_id: &str,
) -> Result<Option<CustomerIdentity>, OstraError> {
    let channel = channel.to_string();
    let external_id = external_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IDENTITY_COLUMNS} FROM customer_identities
                 WHERE channel = ?1 AND external_id = ?2"
            ))?;
            let mut rows = stmt.query_map(params![channel, external_id], row_to_identity)?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_by_phone(
    db: &Database,
    phone: &str,
) -> Result<Option<CustomerIdentity>, OstraError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IDENTITY_COLUMNS} FROM customer_identities
                 WHERE phone = ?1 ORDER BY created_at ASC LIMIT 1"
            ))?;
            let mut rows = stmt.query_map(params![phone], row_to_identity)?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<CustomerIdentity>, OstraError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {IDENTITY_COLUMNS} FROM customer_identities
                 WHERE email = ?1 ORDER BY created_at ASC LIMIT 1"
            ))?;
            let mut rows = stmt.query_map(params![email], row_to_identity)?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn insert(db: &Database, identity: &CustomerIdentity) -> Result<(), OstraError> {
    let identity = identity.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO customer_identities
                 (id, unified_id, channel, external_id, phone, email, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    identity.id,
                    identity.unified_id,
                    identity.channel.to_string(),
                    identity.external_id,
                    identity.phone,
                    identity.email,
                    identity.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Back-fill a phone onto every row of a unified id that has none yet.
pub async fn link_phone(db: &Database, unified_id: &str, phone: &str) -> Result<(), OstraError> {
    let unified_id = unified_id.to_string();
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE customer_identities SET phone = ?1
                 WHERE unified_id = ?2 AND phone IS NULL",
                params![phone, unified_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn find_client_by_phone(
    db: &Database,
    phone: &str,
) -> Result<Option<StoreCustomer>, OstraError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, phone, user_id, name FROM clients WHERE phone = ?1 LIMIT 1",
            )?;
            let mut rows = stmt.query_map(params![phone], |row| {
                Ok(StoreCustomer {
                    id: row.get(0)?,
                    phone: row.get(1)?,
                    user_id: row.get(2)?,
                    name: row.get(3)?,
                })
            })?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn identity(id: &str, unified: &str, channel: Channel, external: &str) -> CustomerIdentity {
        CustomerIdentity {
            id: id.to_string(),
            unified_id: unified.to_string(),
            channel,
            external_id: external.to_string(),
            phone: None,
            email: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_and_find_by_channel() {
        let (db, _dir) = setup_db().await;

        let row = identity("row-1", "u-1", Channel::Telegram, "42");
        insert(&db, &row).await.unwrap();

        let found = find_by_channel(&db, Channel::Telegram, "42")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, row);

        // Same external id on another channel is a different identity.
        assert!(find_by_channel(&db, Channel::Whatsapp, "42")
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_channel_pair_is_rejected() {
        let (db, _dir) = setup_db().await;

        insert(&db, &identity("row-1", "u-1", Channel::Vk, "9"))
            .await
            .unwrap();
        let err = insert(&db, &identity("row-2", "u-2", Channel::Vk, "9")).await;
        assert!(err.is_err());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn link_phone_backfills_unified_rows() {
        let (db, _dir) = setup_db().await;

        insert(&db, &identity("row-1", "u-1", Channel::Telegram, "42"))
            .await
            .unwrap();
        insert(&db, &identity("row-2", "u-1", Channel::Site, "sess-9"))
            .await
            .unwrap();
        let mut keeps_phone = identity("row-3", "u-1", Channel::Vk, "7");
        keeps_phone.phone = Some("+79990001122".to_string());
        insert(&db, &keeps_phone).await.unwrap();

        link_phone(&db, "u-1", "+79995556677").await.unwrap();

        let by_phone = find_by_phone(&db, "+79995556677").await.unwrap().unwrap();
        assert_eq!(by_phone.unified_id, "u-1");

        // A row that already had a phone is left alone.
        let vk = find_by_channel(&db, Channel::Vk, "7").await.unwrap().unwrap();
        assert_eq!(vk.phone.as_deref(), Some("+79990001122"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn client_lookup_by_phone() {
        let (db, _dir) = setup_db().await;

        db.connection()
            .call(|conn| {
                conn.execute(
                    "INSERT INTO clients (id, phone, user_id, name)
                     VALUES ('c-1', '+79990001122', 'user-7', 'Anna')",
                    [],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let client = find_client_by_phone(&db, "+79990001122")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.id, "c-1");
        assert_eq!(client.user_id.as_deref(), Some("user-7"));

        assert!(find_client_by_phone(&db, "+70000000000")
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }
}
