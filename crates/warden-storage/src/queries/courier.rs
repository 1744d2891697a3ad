// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier queue operations: enqueue, claim, status changes.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tracing::{debug, info};
use uuid::Uuid;
use warden_core::{Message, MessageStatus, WardenError};

use crate::codec::encode_time;
use crate::database::{Database, map_tr_err};
use crate::entity::{self, Entity, select_from};
use crate::scope::TenantScope;

/// Enqueue `message` as `queued`, created and updated at `now`.
///
/// A nil id is replaced with a fresh one; the tenant is always the scope's.
pub async fn add_message(
    db: &Database,
    scope: &TenantScope,
    now: DateTime<Utc>,
    message: &mut Message,
) -> Result<(), WardenError> {
    message.status = MessageStatus::Queued;
    message.created_at = now;
    message.updated_at = now;
    entity::insert(db, scope, message).await
}

/// Claim up to `limit` queued messages, oldest first, marking them `processing`.
///
/// Selection and marking run in one `BEGIN IMMEDIATE` transaction, and each
/// row is flipped with a compare-and-set on `status = 'queued'`, so two
/// claimers can never both receive the same message. Returns
/// [`WardenError::QueueEmpty`] when nothing was claimed.
pub async fn next_messages(
    db: &Database,
    scope: &TenantScope,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<Message>, WardenError> {
    if limit == 0 {
        return Err(WardenError::QueueEmpty);
    }

    let select = format!(
        "{} WHERE {} AND status = ?2 ORDER BY created_at ASC, seq ASC LIMIT ?3",
        select_from::<Message>(),
        scope.tenant_predicate(1)
    );
    let mark = format!(
        "UPDATE {} SET status = ?1, updated_at = ?2 WHERE {} AND status = ?5",
        Message::TABLE,
        scope.row_predicate(3)
    );
    let scope_copy = *scope;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let stamp = encode_time(&now)?;

    let claimed = db
        .connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let queued = MessageStatus::Queued.to_string();
            let processing = MessageStatus::Processing.to_string();

            let candidates = {
                let mut stmt = tx.prepare(&select)?;
                stmt.query_map(
                    params![scope_copy.tenant_param(), queued, limit],
                    Message::from_row,
                )?
                .collect::<Result<Vec<Message>, _>>()?
            };

            let mut claimed = Vec::with_capacity(candidates.len());
            {
                let mut stmt = tx.prepare(&mark)?;
                for mut msg in candidates {
                    let [id, nid] = scope_copy.row_params(&msg.id);
                    let changed = stmt.execute(params![processing, stamp, id, nid, queued])?;
                    if changed == 1 {
                        msg.status = MessageStatus::Processing;
                        msg.updated_at = now;
                        claimed.push(msg);
                    }
                }
            }

            tx.commit()?;
            Ok(claimed)
        })
        .await
        .map_err(map_tr_err)?;

    if claimed.is_empty() {
        debug!(tenant = %scope.tenant_id(), "courier queue empty");
        return Err(WardenError::QueueEmpty);
    }
    info!(tenant = %scope.tenant_id(), claimed = claimed.len(), "claimed courier messages");
    Ok(claimed)
}

/// The most recently created message still `queued`.
pub async fn latest_queued_message(
    db: &Database,
    scope: &TenantScope,
) -> Result<Message, WardenError> {
    let sql = format!(
        "{} WHERE {} AND status = ?2 ORDER BY created_at DESC, seq DESC LIMIT 1",
        select_from::<Message>(),
        scope.tenant_predicate(1)
    );
    let tenant = scope.tenant_param();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &sql,
                params![tenant, MessageStatus::Queued.to_string()],
                Message::from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?
        .ok_or(WardenError::QueueEmpty)
}

/// Force `id` into `status`, refreshing `updated_at`. No transition checks.
pub async fn set_message_status(
    db: &Database,
    scope: &TenantScope,
    now: DateTime<Utc>,
    id: Uuid,
    status: MessageStatus,
) -> Result<(), WardenError> {
    let sql = format!(
        "UPDATE {} SET status = ?1, updated_at = ?2 WHERE {}",
        Message::TABLE,
        scope.row_predicate(3)
    );
    let [id_param, nid_param] = scope.row_params(&id);
    let stamp = encode_time(&now)?;
    let rows = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &sql,
                params![status.to_string(), stamp, id_param, nid_param],
            )
        })
        .await
        .map_err(map_tr_err)?;
    scope.expect_affected(rows)?;
    debug!(tenant = %scope.tenant_id(), %id, %status, "message status set");
    Ok(())
}

/// Move `id` from `from` to `to` in a single conditional `UPDATE`.
///
/// When no row matches, the message is read back: a missing row is
/// [`WardenError::NotFound`], a row in another state is
/// [`WardenError::InvalidTransition`] from the stored status.
pub async fn set_message_status_from(
    db: &Database,
    scope: &TenantScope,
    now: DateTime<Utc>,
    id: Uuid,
    from: MessageStatus,
    to: MessageStatus,
) -> Result<(), WardenError> {
    let sql = format!(
        "UPDATE {} SET status = ?1, updated_at = ?2 WHERE {} AND status = ?5",
        Message::TABLE,
        scope.row_predicate(3)
    );
    let [id_param, nid_param] = scope.row_params(&id);
    let stamp = encode_time(&now)?;
    let rows = db
        .connection()
        .call(move |conn| {
            conn.execute(
                &sql,
                params![to.to_string(), stamp, id_param, nid_param, from.to_string()],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if rows == 0 {
        let current = get_message(db, scope, id).await?;
        debug!(
            tenant = %scope.tenant_id(),
            %id,
            expected = %from,
            found = %current.status,
            "message status changed underneath"
        );
        return Err(WardenError::InvalidTransition {
            from: current.status,
            to,
        });
    }
    debug!(tenant = %scope.tenant_id(), %id, %from, %to, "message status moved");
    Ok(())
}

pub async fn get_message(
    db: &Database,
    scope: &TenantScope,
    id: Uuid,
) -> Result<Message, WardenError> {
    entity::get(db, scope, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::{TempDir, tempdir};
    use tracing_test::traced_test;
    use warden_core::TenantId;

    async fn setup_db() -> (Database, TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("courier.db").to_str().unwrap())
            .await
            .unwrap();
        (db, dir)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn enqueue_n(db: &Database, scope: &TenantScope, n: usize) -> Vec<Uuid> {
        let mut ids = Vec::new();
        for i in 0..n {
            let mut msg = Message::email(format!("user{i}@example.com"), "subject", "body");
            add_message(db, scope, t0() + Duration::seconds(i as i64), &mut msg)
                .await
                .unwrap();
            ids.push(msg.id);
        }
        ids
    }

    #[tokio::test]
    async fn add_message_forces_queued_and_timestamps() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());

        let mut msg = Message::email("a@example.com", "s", "b");
        msg.status = MessageStatus::Sent;
        add_message(&db, &scope, t0(), &mut msg).await.unwrap();

        let stored = get_message(&db, &scope, msg.id).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Queued);
        assert_eq!(stored.created_at, t0());
        assert_eq!(stored.updated_at, t0());
        assert_eq!(stored.tenant_id, scope.tenant_id());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claims_in_creation_order_then_empty() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &scope, 5).await;

        for expected in &ids {
            let batch = next_messages(&db, &scope, t0(), 1).await.unwrap();
            assert_eq!(batch.len(), 1);
            assert_eq!(batch[0].id, *expected);
            assert_eq!(batch[0].status, MessageStatus::Processing);
        }
        let err = next_messages(&db, &scope, t0(), 1).await.unwrap_err();
        assert!(err.is_queue_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn identical_timestamps_fall_back_to_insertion_order() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let mut ids = Vec::new();
        for _ in 0..3 {
            let mut msg = Message::email("a@example.com", "s", "b");
            add_message(&db, &scope, t0(), &mut msg).await.unwrap();
            ids.push(msg.id);
        }

        let batch = next_messages(&db, &scope, t0(), 10).await.unwrap();
        let claimed: Vec<Uuid> = batch.iter().map(|m| m.id).collect();
        assert_eq!(claimed, ids);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn zero_limit_claims_nothing() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        enqueue_n(&db, &scope, 1).await;

        assert!(next_messages(&db, &scope, t0(), 0).await.unwrap_err().is_queue_empty());
        assert_eq!(next_messages(&db, &scope, t0(), 1).await.unwrap().len(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    #[traced_test]
    async fn claim_is_logged_with_count() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        enqueue_n(&db, &scope, 2).await;

        next_messages(&db, &scope, t0(), 5).await.unwrap();
        assert!(logs_contain("claimed courier messages"));
        assert!(logs_contain("claimed=2"));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn queues_are_isolated_per_tenant() {
        let (db, _dir) = setup_db().await;
        let a = TenantScope::new(TenantId::new_v4());
        let b = TenantScope::new(TenantId::new_v4());
        enqueue_n(&db, &a, 2).await;

        assert!(next_messages(&db, &b, t0(), 10).await.unwrap_err().is_queue_empty());
        assert!(latest_queued_message(&db, &b).await.unwrap_err().is_queue_empty());
        assert_eq!(next_messages(&db, &a, t0(), 10).await.unwrap().len(), 2);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn latest_queued_is_newest_unclaimed() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        assert!(latest_queued_message(&db, &scope).await.unwrap_err().is_queue_empty());

        let ids = enqueue_n(&db, &scope, 3).await;
        assert_eq!(latest_queued_message(&db, &scope).await.unwrap().id, ids[2]);

        set_message_status(&db, &scope, t0(), ids[2], MessageStatus::Sent)
            .await
            .unwrap();
        assert_eq!(latest_queued_message(&db, &scope).await.unwrap().id, ids[1]);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn requeued_message_keeps_its_fifo_position() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &scope, 3).await;

        let first = next_messages(&db, &scope, t0(), 1).await.unwrap();
        assert_eq!(first[0].id, ids[0]);
        let later = t0() + Duration::hours(1);
        set_message_status(&db, &scope, later, ids[0], MessageStatus::Queued)
            .await
            .unwrap();

        let again = next_messages(&db, &scope, later, 1).await.unwrap();
        assert_eq!(again[0].id, ids[0]);
        assert_eq!(again[0].updated_at, later);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sent_message_is_never_claimed() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &scope, 1).await;

        set_message_status(&db, &scope, t0(), ids[0], MessageStatus::Sent)
            .await
            .unwrap();
        assert!(next_messages(&db, &scope, t0(), 1).await.unwrap_err().is_queue_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn status_change_for_other_tenant_is_not_found() {
        let (db, _dir) = setup_db().await;
        let owner = TenantScope::new(TenantId::new_v4());
        let other = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &owner, 1).await;

        let err = set_message_status(&db, &other, t0(), ids[0], MessageStatus::Sent)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            get_message(&db, &owner, ids[0]).await.unwrap().status,
            MessageStatus::Queued
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conditional_status_change_applies_when_state_matches() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &scope, 1).await;
        next_messages(&db, &scope, t0(), 1).await.unwrap();

        let later = t0() + Duration::minutes(5);
        set_message_status_from(
            &db,
            &scope,
            later,
            ids[0],
            MessageStatus::Processing,
            MessageStatus::Sent,
        )
        .await
        .unwrap();

        let stored = get_message(&db, &scope, ids[0]).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Sent);
        assert_eq!(stored.updated_at, later);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conditional_status_change_loses_to_an_earlier_claim() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &scope, 1).await;

        // A worker claims the message after the caller saw it queued.
        next_messages(&db, &scope, t0(), 1).await.unwrap();
        let err = set_message_status_from(
            &db,
            &scope,
            t0() + Duration::seconds(1),
            ids[0],
            MessageStatus::Queued,
            MessageStatus::Processing,
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            WardenError::InvalidTransition {
                from: MessageStatus::Processing,
                to: MessageStatus::Processing
            }
        ));
        let stored = get_message(&db, &scope, ids[0]).await.unwrap();
        assert_eq!(stored.updated_at, t0());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn conditional_status_change_on_missing_or_foreign_row_is_not_found() {
        let (db, _dir) = setup_db().await;
        let owner = TenantScope::new(TenantId::new_v4());
        let other = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &owner, 1).await;

        for (scope, id) in [(&other, ids[0]), (&owner, Uuid::new_v4())] {
            let err = set_message_status_from(
                &db,
                scope,
                t0(),
                id,
                MessageStatus::Queued,
                MessageStatus::Processing,
            )
            .await
            .unwrap_err();
            assert!(err.is_not_found(), "got {err:?}");
        }
        assert_eq!(
            get_message(&db, &owner, ids[0]).await.unwrap().status,
            MessageStatus::Queued
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn out_of_range_clock_is_refused_before_writing() {
        let (db, _dir) = setup_db().await;
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&db, &scope, 1).await;

        let err = next_messages(&db, &scope, DateTime::<Utc>::MAX_UTC, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::Storage { .. }), "got {err:?}");
        let err = set_message_status(&db, &scope, DateTime::<Utc>::MAX_UTC, ids[0], MessageStatus::Sent)
            .await
            .unwrap_err();
        assert!(matches!(err, WardenError::Storage { .. }), "got {err:?}");

        let stored = get_message(&db, &scope, ids[0]).await.unwrap();
        assert_eq!(stored.status, MessageStatus::Queued);
        db.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_claimers_never_share_a_message() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("race.db");
        let first = Database::open(path.to_str().unwrap()).await.unwrap();
        let second = Database::open(path.to_str().unwrap()).await.unwrap();
        let scope = TenantScope::new(TenantId::new_v4());
        enqueue_n(&first, &scope, 1).await;

        let (a, b) = tokio::join!(
            next_messages(&first, &scope, t0(), 1),
            next_messages(&second, &scope, t0(), 1)
        );
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        let empties = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(WardenError::QueueEmpty)))
            .count();
        assert_eq!((successes, empties), (1, 1));

        first.close().await.unwrap();
        second.close().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn draining_from_two_handles_claims_each_message_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("drain.db");
        let first = Database::open(path.to_str().unwrap()).await.unwrap();
        let second = Database::open(path.to_str().unwrap()).await.unwrap();
        let scope = TenantScope::new(TenantId::new_v4());
        let ids = enqueue_n(&first, &scope, 20).await;

        async fn drain(db: Database, scope: TenantScope) -> Vec<Uuid> {
            let mut seen = Vec::new();
            loop {
                match next_messages(&db, &scope, Utc::now(), 3).await {
                    Ok(batch) => seen.extend(batch.into_iter().map(|m| m.id)),
                    Err(WardenError::QueueEmpty) => return seen,
                    Err(e) => panic!("claim failed: {e}"),
                }
            }
        }

        let (a, b) = tokio::join!(
            tokio::spawn(drain(first.clone(), scope)),
            tokio::spawn(drain(second.clone(), scope))
        );
        let mut all: Vec<Uuid> = a.unwrap().into_iter().chain(b.unwrap()).collect();
        all.sort();
        let mut expected = ids;
        expected.sort();
        assert_eq!(all, expected);

        first.close().await.unwrap();
        second.close().await.unwrap();
    }
}
