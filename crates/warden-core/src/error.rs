// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Warden persistence core.

use thiserror::Error;

use crate::types::MessageStatus;

/// The error type returned by every persister and storage operation.
///
/// Backend-specific failures are translated into these variants once, at the
/// storage boundary. Callers match on the variant rather than on driver codes.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// No message is currently queued for the tenant.
    ///
    /// This is an expected, non-fatal outcome and never signals a backend fault.
    #[error("queue is empty")]
    QueueEmpty,

    /// The record does not exist or belongs to a different tenant.
    ///
    /// Both causes produce the same error so callers cannot probe for
    /// identifiers owned by other tenants.
    #[error("record not found")]
    NotFound,

    /// A write collided with an existing record (duplicate identifier, etc.).
    #[error("constraint violation: {source}")]
    ConstraintViolation {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend could not be reached or refused the operation (locked, closed, I/O).
    #[error("backend unavailable: {source}")]
    BackendUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Any other storage failure (malformed row, serialization, SQL error).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A partial update named a column the entity does not map.
    #[error("unknown column `{column}` for table `{table}`")]
    UnknownColumn { table: String, column: String },

    /// A checked status change was rejected by the message state machine.
    #[error("illegal message status transition from {from} to {to}")]
    InvalidTransition {
        from: MessageStatus,
        to: MessageStatus,
    },

    /// The handle's cancellation signal fired before the operation was issued.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WardenError {
    /// Returns true for the "nothing to do" queue signal.
    pub fn is_queue_empty(&self) -> bool {
        matches!(self, WardenError::QueueEmpty)
    }

    /// Returns true if the record is absent or owned by another tenant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WardenError::NotFound)
    }

    /// Returns true if the failure came from the backend being unreachable.
    pub fn is_backend_unavailable(&self) -> bool {
        matches!(self, WardenError::BackendUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_empty_is_distinct_from_backend_failure() {
        let empty = WardenError::QueueEmpty;
        let down = WardenError::BackendUnavailable {
            source: Box::new(std::io::Error::other("connection refused")),
        };

        assert!(empty.is_queue_empty());
        assert!(!empty.is_backend_unavailable());
        assert!(down.is_backend_unavailable());
        assert!(!down.is_queue_empty());
    }

    #[test]
    fn not_found_message_does_not_mention_tenant() {
        let msg = WardenError::NotFound.to_string();
        assert_eq!(msg, "record not found");
    }

    #[test]
    fn invalid_transition_renders_both_states() {
        let err = WardenError::InvalidTransition {
            from: MessageStatus::Sent,
            to: MessageStatus::Queued,
        };
        assert_eq!(
            err.to_string(),
            "illegal message status transition from sent to queued"
        );
    }
}
