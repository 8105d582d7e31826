// SPDX-FileCopyrightText: 2026 Ostra Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue operations: at-least-once delivery with consumer groups,
//! exponential retry backoff, and a dead-letter table.
//!
//! Failure handling follows the re-enqueue model: a failed entry is copied
//! into a fresh pending row (retry_count + 1, visible after `2^retry` seconds)
//! and the original is retired, so the original delivery is never redelivered
//! as-is. At `max_retries` the payload moves to `dead_letters` instead.

use chrono::{Duration, Utc};
use ostra_core::OstraError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{DeadLetter, QueueEntry, RetryOutcome};

/// Timestamp format matching SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ')`,
/// so Rust-side and default-clause timestamps compare lexicographically.
const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn now_ts() -> String {
    Utc::now().format(TS_FORMAT).to_string()
}

fn ts_after(delay_secs: i64) -> String {
    (Utc::now() + Duration::seconds(delay_secs))
        .format(TS_FORMAT)
        .to_string()
}

/// Register a consumer group on a stream. Idempotent.
pub async fn ensure_group(db: &Database, stream: &str, group: &str) -> Result<(), OstraError> {
    let stream = stream.to_string();
    let group = group.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO queue_groups (stream, name) VALUES (?1, ?2)",
                params![stream, group],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enqueue a new message. Returns the auto-generated queue entry ID.
pub async fn enqueue(
    db: &Database,
    stream: &str,
    message_id: &str,
    payload: &str,
) -> Result<i64, OstraError> {
    enqueue_with(db, stream, message_id, payload, 0, 0).await
}

/// Enqueue with an explicit retry count and visibility delay. Used by the
/// retry path; plain producers go through [`enqueue`].
pub async fn enqueue_with(
    db: &Database,
    stream: &str,
    message_id: &str,
    payload: &str,
    retry_count: u32,
    delay_secs: u64,
) -> Result<i64, OstraError> {
    let stream = stream.to_string();
    let message_id = message_id.to_string();
    let payload = payload.to_string();
    let available_at = ts_after(delay_secs as i64);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO queue (stream, message_id, payload, retry_count, available_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![stream, message_id, payload, retry_count, available_at],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Dequeue up to `batch` visible entries from the stream.
///
/// Atomically marks each claimed entry as "processing" with a lock owned by
/// `consumer`. Entries whose lock expired (a worker crashed mid-flight) are
/// reclaimed alongside fresh pending ones, which is where the at-least-once
/// guarantee comes from.
pub async fn dequeue_batch(
    db: &Database,
    stream: &str,
    consumer: &str,
    batch: i64,
    lock_secs: i64,
) -> Result<Vec<QueueEntry>, OstraError> {
    let stream = stream.to_string();
    let consumer = consumer.to_string();
    let now = now_ts();
    let locked_until = ts_after(lock_secs);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let entries = {
                let mut stmt = tx.prepare(
                    "SELECT id, stream, message_id, payload, status, retry_count,
                            available_at, created_at, updated_at
                     FROM queue
                     WHERE stream = ?1
                       AND ((status = 'pending' AND available_at <= ?2)
                            OR (status = 'processing' AND locked_until < ?2))
                     ORDER BY id ASC
                     LIMIT ?3",
                )?;
                let rows = stmt.query_map(params![stream, now, batch], |row| {
                    Ok(QueueEntry {
                        id: row.get(0)?,
                        stream: row.get(1)?,
                        message_id: row.get(2)?,
                        payload: row.get(3)?,
                        status: row.get(4)?,
                        retry_count: row.get(5)?,
                        available_at: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()?
            };

            let mut claimed = Vec::with_capacity(entries.len());
            for entry in entries {
                tx.execute(
                    "UPDATE queue SET status = 'processing',
                     locked_by = ?1, locked_until = ?2, updated_at = ?3
                     WHERE id = ?4",
                    params![consumer, locked_until, now, entry.id],
                )?;
                claimed.push(QueueEntry {
                    status: "processing".to_string(),
                    ..entry
                });
            }
            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Acknowledge successful processing. The entry is retired as "completed".
pub async fn ack(db: &Database, id: i64) -> Result<(), OstraError> {
    let now = now_ts();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_by = NULL,
                 locked_until = NULL, updated_at = ?1
                 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Handle a processing failure for a claimed entry.
///
/// Below `max_retries` the payload is re-enqueued as a fresh row with
/// `retry_count + 1` and a `2^retry_count` second visibility delay; at the
/// limit it moves to `dead_letters`. Either way the original row is retired
/// in the same transaction, so a crash between the two steps cannot drop
/// or duplicate the message.
pub async fn fail(
    db: &Database,
    entry: &QueueEntry,
    error: &str,
    max_retries: u32,
) -> Result<RetryOutcome, OstraError> {
    let id = entry.id;
    let stream = entry.stream.clone();
    let message_id = entry.message_id.clone();
    let payload = entry.payload.clone();
    let error = error.to_string();
    let next_retry = entry.retry_count + 1;
    let now = now_ts();

    if next_retry > max_retries {
        db.connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO dead_letters (stream, message_id, payload, error, failed_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![stream, message_id, payload, error, now],
                )?;
                tx.execute(
                    "UPDATE queue SET status = 'dead', locked_by = NULL,
                     locked_until = NULL, updated_at = ?1
                     WHERE id = ?2",
                    params![now, id],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(RetryOutcome::DeadLettered)
    } else {
        let delay_secs = 2u64.pow(entry.retry_count);
        let available_at = ts_after(delay_secs as i64);
        db.connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO queue (stream, message_id, payload, retry_count, available_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![stream, message_id, payload, next_retry, available_at],
                )?;
                tx.execute(
                    "UPDATE queue SET status = 'retried', locked_by = NULL,
                     locked_until = NULL, updated_at = ?1
                     WHERE id = ?2",
                    params![now, id],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(RetryOutcome::Requeued { delay_secs })
    }
}

/// Number of entries still awaiting delivery on a stream.
pub async fn pending_count(db: &Database, stream: &str) -> Result<i64, OstraError> {
    let stream = stream.to_string();
    db.connection()
        .call(move |conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM queue
                 WHERE stream = ?1 AND status IN ('pending', 'processing')",
                params![stream],
                |row| row.get(0),
            )?)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Dead letters for a stream, newest first. Operator-facing.
pub async fn list_dead_letters(
    db: &Database,
    stream: &str,
    limit: i64,
) -> Result<Vec<DeadLetter>, OstraError> {
    let stream = stream.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, stream, message_id, payload, error, failed_at
                 FROM dead_letters
                 WHERE stream = ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![stream, limit], |row| {
                Ok(DeadLetter {
                    id: row.get(0)?,
                    stream: row.get(1)?,
                    message_id: row.get(2)?,
                    payload: row.get(3)?,
                    error: row.get(4)?,
                    failed_at: row.get(5)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
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

    /// Backdate a queue row's visibility so tests need not sleep.
    async fn make_visible(db: &Database, queue_id: i64) {
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE queue SET available_at = '2000-01-01T00:00:00.000Z' WHERE id = ?1",
                    params![queue_id],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_lifecycle() {
        let (db, _dir) = setup_db().await;
        ensure_group(&db, "incoming", "workers").await.unwrap();

        let id = enqueue(&db, "incoming", "telegram:42:1", r#"{"text":"hi"}"#)
            .await
            .unwrap();
        assert!(id > 0);

        let batch = dequeue_batch(&db, "incoming", "worker-0", 10, 300)
            .await
            .unwrap();
        assert_eq!(batch.len(), 1);
        let entry = &batch[0];
        assert_eq!(entry.id, id);
        assert_eq!(entry.status, "processing");
        assert_eq!(entry.message_id, "telegram:42:1");
        assert_eq!(entry.retry_count, 0);

        // Claimed entries are invisible to other consumers.
        let again = dequeue_batch(&db, "incoming", "worker-1", 10, 300)
            .await
            .unwrap();
        assert!(again.is_empty());

        ack(&db, id).await.unwrap();
        assert_eq!(pending_count(&db, "incoming").await.unwrap(), 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn streams_are_isolated() {
        let (db, _dir) = setup_db().await;

        enqueue(&db, "incoming", "m-1", "a").await.unwrap();
        enqueue(&db, "other", "m-2", "b").await.unwrap();

        let batch = dequeue_batch(&db, "incoming", "w", 10, 300).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].message_id, "m-1");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_requeues_with_exponential_delay() {
        let (db, _dir) = setup_db().await;

        enqueue(&db, "incoming", "m-1", "payload").await.unwrap();
        let entry = dequeue_batch(&db, "incoming", "w", 1, 300)
            .await
            .unwrap()
            .remove(0);

        let outcome = fail(&db, &entry, "provider down", 3).await.unwrap();
        assert_eq!(outcome, RetryOutcome::Requeued { delay_secs: 1 });

        // The retry row is delayed, so an immediate dequeue sees nothing.
        let batch = dequeue_batch(&db, "incoming", "w", 10, 300).await.unwrap();
        assert!(batch.is_empty());

        // Backdate it and the retry becomes deliverable with retry_count 1.
        let retry_id: i64 = db
            .connection()
            .call(|conn| {
                Ok::<_, rusqlite::Error>(conn.query_row(
                    "SELECT id FROM queue WHERE status = 'pending'",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        make_visible(&db, retry_id).await;

        let entry = dequeue_batch(&db, "incoming", "w", 1, 300)
            .await
            .unwrap()
            .remove(0);
        assert_eq!(entry.retry_count, 1);
        assert_eq!(entry.message_id, "m-1");

        // Second failure backs off 2^1 seconds.
        let outcome = fail(&db, &entry, "still down", 3).await.unwrap();
        assert_eq!(outcome, RetryOutcome::Requeued { delay_secs: 2 });

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn fail_dead_letters_at_max_retries() {
        let (db, _dir) = setup_db().await;

        enqueue(&db, "incoming", "m-1", "payload").await.unwrap();

        let max_retries = 3;
        for attempt in 0..=max_retries {
            let pending: i64 = db
                .connection()
                .call(|conn| {
                    Ok::<_, rusqlite::Error>(conn.query_row(
                        "SELECT id FROM queue WHERE status = 'pending'",
                        [],
                        |row| row.get(0),
                    )?)
                })
                .await
                .unwrap();
            make_visible(&db, pending).await;

            let entry = dequeue_batch(&db, "incoming", "w", 1, 300)
                .await
                .unwrap()
                .remove(0);
            assert_eq!(entry.retry_count, attempt);

            let outcome = fail(&db, &entry, "boom", max_retries).await.unwrap();
            if attempt < max_retries {
                assert!(matches!(outcome, RetryOutcome::Requeued { .. }));
            } else {
                assert_eq!(outcome, RetryOutcome::DeadLettered);
            }
        }

        let dead = list_dead_letters(&db, "incoming", 10).await.unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].message_id, "m-1");
        assert_eq!(dead[0].error, "boom");
        assert_eq!(pending_count(&db, "incoming").await.unwrap(), 0);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn expired_lock_is_reclaimed() {
        let (db, _dir) = setup_db().await;

        let id = enqueue(&db, "incoming", "m-1", "payload").await.unwrap();
        let claimed = dequeue_batch(&db, "incoming", "worker-0", 1, 300)
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);

        // Simulate a crashed worker by expiring the lock.
        db.connection()
            .call(move |conn| {
                conn.execute(
                    "UPDATE queue SET locked_until = '2000-01-01T00:00:00.000Z' WHERE id = ?1",
                    params![id],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        let reclaimed = dequeue_batch(&db, "incoming", "worker-1", 1, 300)
            .await
            .unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn ensure_group_is_idempotent() {
        let (db, _dir) = setup_db().await;
        ensure_group(&db, "incoming", "workers").await.unwrap();
        ensure_group(&db, "incoming", "workers").await.unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| {
                Ok::<_, rusqlite::Error>(conn.query_row(
                    "SELECT COUNT(*) FROM queue_groups",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_writers_no_sqlite_busy() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("concurrent_test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                enqueue(&db, "incoming", &format!("m-{i}"), &format!(r#"{{"n":{i}}}"#)).await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap();
            assert!(result.is_ok(), "concurrent write failed: {result:?}");
        }

        assert_eq!(pending_count(&db, "incoming").await.unwrap(), 10);
        db.close().await.unwrap();
    }
}
