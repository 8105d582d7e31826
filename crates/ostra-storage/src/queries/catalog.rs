// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog and supply window reads.

use std::str::FromStr;

use ostra_core::types::{Product, ProductStatus, Supply, SupplyItem};
use ostra_core::OstraError;
use rust_decimal::Decimal;
use rusqlite::params;

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

fn row_to_product(row: &rusqlite::Row<'_>) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        price: parse_text::<Decimal>(3, row.get(3)?)?,
        unit: row.get(4)?,
        status: parse_text::<ProductStatus>(5, row.get(5)?)?,
        short_description: row.get(6)?,
        display_order: row.get(7)?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, category, price, unit, status, short_description, display_order";

/// Case-insensitive substring match over orderable products.
pub async fn find_by_name_substring(
    db: &Database,
    text: &str,
) -> Result<Vec<Product>, OstraError> {
    let pattern = format!("%{}%", text.to_lowercase());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products
                 WHERE lower(name) LIKE ?1 AND status IN ('available', 'preorder')
                 ORDER BY display_order ASC, name ASC"
            ))?;
            let rows = stmt.query_map(params![pattern], row_to_product)?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_by_id(db: &Database, id: &str) -> Result<Option<Product>, OstraError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], row_to_product)?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn list_available(
    db: &Database,
    category: Option<&str>,
    limit: i64,
) -> Result<Vec<Product>, OstraError> {
    let category = category.map(str::to_string);
    db.connection()
        .call(move |conn| {
            let products = match category {
                Some(category) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {PRODUCT_COLUMNS} FROM products
                         WHERE status IN ('available', 'preorder') AND category = ?1
                         ORDER BY display_order ASC, name ASC
                         LIMIT ?2"
                    ))?;
                    let rows = stmt.query_map(params![category, limit], row_to_product)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {PRODUCT_COLUMNS} FROM products
                         WHERE status IN ('available', 'preorder')
                         ORDER BY display_order ASC, name ASC
                         LIMIT ?1"
                    ))?;
                    let rows = stmt.query_map(params![limit], row_to_product)?;
                    rows.collect::<Result<Vec<_>, _>>()?
                }
            };
            Ok(products)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Active supply windows dated today or later, soonest first.
pub async fn list_upcoming_supplies(db: &Database, limit: i64) -> Result<Vec<Supply>, OstraError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, supply_date, is_active FROM supplies
                 WHERE is_active = 1 AND supply_date >= date('now')
                 ORDER BY supply_date ASC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], |row| {
                Ok(Supply {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    supply_date: row.get(2)?,
                    is_active: row.get(3)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The product's line in the currently active supply, if any.
pub async fn active_supply_for(
    db: &Database,
    product_id: &str,
) -> Result<Option<SupplyItem>, OstraError> {
    let product_id = product_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT si.supply_id, si.product_id, si.quantity, si.reserved_qty
                 FROM supply_items si
                 JOIN supplies s ON s.id = si.supply_id
                 WHERE s.is_active = 1 AND si.product_id = ?1
                 ORDER BY s.supply_date ASC
                 LIMIT 1",
            )?;
            let mut rows = stmt.query_map(params![product_id], |row| {
                Ok(SupplyItem {
                    supply_id: row.get(0)?,
                    product_id: row.get(1)?,
                    quantity: row.get(2)?,
                    reserved_qty: row.get(3)?,
                })
            })?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
