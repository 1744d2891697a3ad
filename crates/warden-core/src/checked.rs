// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validating wrapper around the raw courier primitives.
//!
//! [`CourierPersister::set_message_status`] accepts any target state so that
//! retry and operator tooling can force a message where it needs to go.
//! Untrusted callers go through [`CheckedCourier`] instead, which rejects
//! transitions the message state machine does not allow.

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::WardenError;
use crate::traits::CourierPersister;
use crate::types::{Message, MessageStatus};

/// Courier persister that enforces `queued → processing → sent` (plus
/// `processing → queued` for retry) on status changes.
///
/// The status read for the check is the one the write is conditioned on: the
/// change goes through [`CourierPersister::set_message_status_from`], so if
/// another writer moved the message in between, nothing is written and the
/// caller gets [`WardenError::InvalidTransition`] from the newer status.
pub struct CheckedCourier<P> {
    inner: P,
}

impl<P: CourierPersister> CheckedCourier<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: CourierPersister> CourierPersister for CheckedCourier<P> {
    async fn add_message(&self, message: &mut Message) -> Result<(), WardenError> {
        self.inner.add_message(message).await
    }

    async fn next_messages(&self, limit: usize) -> Result<Vec<Message>, WardenError> {
        self.inner.next_messages(limit).await
    }

    async fn latest_queued_message(&self) -> Result<Message, WardenError> {
        self.inner.latest_queued_message().await
    }

    async fn set_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<(), WardenError> {
        let current = self.inner.get_message(id).await?;
        if !current.status.can_transition_to(status) {
            debug!(%id, from = %current.status, to = %status, "rejected status transition");
            return Err(WardenError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }
        self.inner
            .set_message_status_from(id, current.status, status)
            .await
    }

    async fn set_message_status_from(
        &self,
        id: Uuid,
        from: MessageStatus,
        to: MessageStatus,
    ) -> Result<(), WardenError> {
        if !from.can_transition_to(to) {
            debug!(%id, %from, %to, "rejected status transition");
            return Err(WardenError::InvalidTransition { from, to });
        }
        self.inner.set_message_status_from(id, from, to).await
    }

    async fn get_message(&self, id: Uuid) -> Result<Message, WardenError> {
        self.inner.get_message(id).await
    }
}
