// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Courier queue operations.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::WardenError;
use crate::types::{Message, MessageStatus};

/// FIFO queue of outbound messages, scoped to the persister's tenant.
#[async_trait]
pub trait CourierPersister: Send + Sync {
    /// Enqueue a message.
    ///
    /// Assigns `id` and `tenant_id` when nil, forces `status` to `queued` and
    /// stamps `created_at`/`updated_at` from the persister's clock. The passed
    /// message is updated in place with the stored values.
    async fn add_message(&self, message: &mut Message) -> Result<(), WardenError>;

    /// Claim up to `limit` queued messages, oldest first.
    ///
    /// The returned messages are already `processing`. Concurrent callers
    /// never receive the same message. Returns [`WardenError::QueueEmpty`]
    /// when nothing is queued.
    async fn next_messages(&self, limit: usize) -> Result<Vec<Message>, WardenError>;

    /// The most recently created message that is still `queued`.
    async fn latest_queued_message(&self) -> Result<Message, WardenError>;

    /// Set a message's status without validating the transition.
    ///
    /// Intended for trusted callers (the delivery worker, operator tooling).
    /// See [`crate::CheckedCourier`] for the validating variant.
    async fn set_message_status(&self, id: Uuid, status: MessageStatus)
    -> Result<(), WardenError>;

    /// Move a message from `from` to `to` only if it is still in `from`.
    ///
    /// The check and the write are one atomic step. If the message exists but
    /// is no longer in `from`, nothing is written and the call returns
    /// [`WardenError::InvalidTransition`] carrying the status actually stored.
    async fn set_message_status_from(
        &self,
        id: Uuid,
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<(), WardenError>;

    /// Point lookup of a single message.
    async fn get_message(&self, id: Uuid) -> Result<Message, WardenError>;
}
