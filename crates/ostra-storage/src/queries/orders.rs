// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order persistence: atomic creation and status lookups.

use std::str::FromStr;

use chrono::Utc;
use ostra_core::types::{NewOrder, OrderStatus, OrderSummary, ValidatedItem, ValidatedOrder};
use ostra_core::OstraError;
use rust_decimal::Decimal;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;

fn parse_text<T>(idx: usize, value: String) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Persist an order, its line items, and the initial history entry in one
/// transaction. The UNIQUE constraint on `order_number` rejects collisions;
/// the caller regenerates the number and retries.
pub async fn create(
    db: &Database,
    order: &NewOrder,
    user_id: Option<&str>,
) -> Result<ValidatedOrder, OstraError> {
    let order = order.clone();
    let user_id = user_id.map(str::to_string);
    let order_id = Uuid::new_v4().to_string();
    let created_at = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();

    let persisted = {
        let order_id = order_id.clone();
        let created_at = created_at.clone();
        let order = order.clone();
        db.connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO orders
                     (id, order_number, customer_id, user_id, channel, total_amount,
                      delivery_street, delivery_house, delivery_flat, delivery_porch,
                      delivery_floor, delivery_comment, delivery_date, slot,
                      payment_method, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                             ?14, ?15, 'new', ?16)",
                    params![
                        order_id,
                        order.order_number,
                        order.customer_id,
                        user_id,
                        order.channel.to_string(),
                        order.total_amount.to_string(),
                        order.address.street,
                        order.address.house,
                        order.address.flat,
                        order.address.porch,
                        order.address.floor,
                        order.address.comment,
                        order.delivery_date,
                        order.slot.to_string(),
                        order.payment_method.to_string(),
                        created_at,
                    ],
                )?;
                for item in &order.items {
                    tx.execute(
                        "INSERT INTO order_items
                         (order_id, product_id, name, quantity, unit_price, line_total)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            order_id,
                            item.product_id,
                            item.name,
                            item.quantity,
                            item.unit_price.to_string(),
                            item.line_total.to_string(),
                        ],
                    )?;
                }
                tx.execute(
                    "INSERT INTO order_history
                     (order_id, changed_by, old_status, new_status, created_at)
                     VALUES (?1, 'agent', NULL, 'new', ?2)",
                    params![order_id, created_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    };
    persisted?;

    Ok(ValidatedOrder {
        id: order_id,
        order_number: order.order_number,
        items: order.items,
        total_amount: order.total_amount,
        status: OrderStatus::New,
        delivery_date: order.delivery_date,
        slot: order.slot,
        created_at,
    })
}

/// Orders for a storefront user id, newest first.
pub async fn find_by_user(
    db: &Database,
    user_id: &str,
    limit: i64,
) -> Result<Vec<OrderSummary>, OstraError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT order_number, status, total_amount, delivery_date, created_at
                 FROM orders
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![user_id, limit], row_to_summary)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a single order by its human-facing number.
pub async fn find_by_number(
    db: &Database,
    order_number: &str,
) -> Result<Option<OrderSummary>, OstraError> {
    let order_number = order_number.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT order_number, status, total_amount, delivery_date, created_at
                 FROM orders
                 WHERE order_number = ?1",
            )?;
            let mut rows = stmt.query_map(params![order_number], row_to_summary)?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Line items of a persisted order.
pub async fn items_for(db: &Database, order_id: &str) -> Result<Vec<ValidatedItem>, OstraError> {
    let order_id = order_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT product_id, name, quantity, unit_price, line_total
                 FROM order_items
                 WHERE order_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![order_id], |row| {
                Ok(ValidatedItem {
                    product_id: row.get(0)?,
                    name: row.get(1)?,
                    quantity: row.get(2)?,
                    unit_price: parse_text::<Decimal>(3, row.get(3)?)?,
                    line_total: parse_text::<Decimal>(4, row.get(4)?)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> Result<OrderSummary, rusqlite::Error> {
    Ok(OrderSummary {
        order_number: row.get(0)?,
        status: parse_text::<OrderStatus>(1, row.get(1)?)?,
        total_amount: parse_text::<Decimal>(2, row.get(2)?)?,
        delivery_date: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use ostra_core::types::{Channel, DeliveryAddress, DeliverySlot, PaymentMethod};
    use tempfile::tempdir;

    use super::*;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn sample_order(number: &str) -> NewOrder {
        NewOrder {
            order_number: number.to_string(),
            customer_id: "u-1".to_string(),
            phone: Some("+79990001122".to_string()),
            channel: Channel::Telegram,
            items: vec![
                ValidatedItem {
                    product_id: "p-1".to_string(),
                    name: "Сыр камамбер".to_string(),
                    quantity: 2,
                    unit_price: Decimal::new(89000, 2),
                    line_total: Decimal::new(178000, 2),
                },
                ValidatedItem {
                    product_id: "p-4".to_string(),
                    name: "Мёд липовый".to_string(),
                    quantity: 1,
                    unit_price: Decimal::new(45000, 2),
                    line_total: Decimal::new(45000, 2),
                },
            ],
            total_amount: Decimal::new(223000, 2),
            address: DeliveryAddress {
                street: "Ленина".to_string(),
                house: "10".to_string(),
                flat: Some("5".to_string()),
                porch: None,
                floor: None,
                comment: None,
            },
            delivery_date: "2026-09-05".to_string(),
            slot: DeliverySlot::Evening,
            payment_method: PaymentMethod::Cash,
        }
    }

    #[tokio::test]
    async fn create_persists_items_and_history_atomically() {
        let (db, _dir) = setup_db().await;

        let order = create(&db, &sample_order("O260905-AB12"), Some("user-7"))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.total_amount, Decimal::new(223000, 2));

        let items = items_for(&db, &order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_total, Decimal::new(178000, 2));

        let history_count: i64 = db
            .connection()
            .call(|conn| {
                Ok::<_, rusqlite::Error>(conn.query_row(
                    "SELECT COUNT(*) FROM order_history",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(history_count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_order_number_is_rejected() {
        let (db, _dir) = setup_db().await;

        create(&db, &sample_order("O260905-AB12"), None)
            .await
            .unwrap();
        let err = create(&db, &sample_order("O260905-AB12"), None).await;
        assert!(err.is_err());

        // The rejected transaction left no partial rows behind.
        let item_count: i64 = db
            .connection()
            .call(|conn| {
                Ok::<_, rusqlite::Error>(conn.query_row(
                    "SELECT COUNT(*) FROM order_items",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(item_count, 2);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_by_user_newest_first() {
        let (db, _dir) = setup_db().await;

        for n in ["O260901-AAAA", "O260902-BBBB", "O260903-CCCC"] {
            create(&db, &sample_order(n), Some("user-7")).await.unwrap();
        }
        create(&db, &sample_order("O260904-DDDD"), Some("user-8"))
            .await
            .unwrap();

        let summaries = find_by_user(&db, "user-7", 2).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].order_number, "O260903-CCCC");
        assert_eq!(summaries[1].order_number, "O260902-BBBB");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn find_by_number() {
        let (db, _dir) = setup_db().await;

        create(&db, &sample_order("O260905-AB12"), None)
            .await
            .unwrap();

        let hit = super::find_by_number(&db, "O260905-AB12")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.status, OrderStatus::New);
        assert!(super::find_by_number(&db, "O000000-ZZZZ")
            .await
            .unwrap()
            .is_none());

        db.close().await.unwrap();
    }
}
