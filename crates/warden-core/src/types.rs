// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the persister traits and storage backends.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Identifier of the isolation boundary ("network") that owns every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    /// Generate a fresh random tenant identifier.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns true if the identifier has not been assigned.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is not operational.
    Unhealthy(String),
}

// --- Courier ---

/// Delivery state of a queued message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Waiting to be claimed by a worker.
    #[default]
    Queued,
    /// Claimed by exactly one worker; delivery in progress.
    Processing,
    /// Delivered. Terminal.
    Sent,
}

impl MessageStatus {
    /// Whether the courier state machine allows moving from `self` to `next`.
    ///
    /// `sent` is terminal. A claimed message may be finalized or handed back
    /// to the queue for retry. Staying in the same state is not a transition.
    pub fn can_transition_to(self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (MessageStatus::Queued, MessageStatus::Processing)
                | (MessageStatus::Processing, MessageStatus::Sent)
                | (MessageStatus::Processing, MessageStatus::Queued)
        )
    }
}

/// Delivery channel of a message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Email,
    Phone,
}

/// An outbound notification waiting in (or drained from) the courier queue.
///
/// A nil `id` or `tenant_id` means "not yet assigned"; the persister fills
/// both in on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub status: MessageStatus,
    pub message_type: MessageType,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub template_type: Option<String>,
    pub template_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Build an unsaved email message.
    pub fn email(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_type: MessageType::Email,
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            ..Default::default()
        }
    }
}

// --- Self-service flows ---

/// How the client drives a flow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    /// Native or server-side clients using the JSON API.
    Api,
    /// Browser clients using redirects and cookies.
    #[default]
    Browser,
}

/// Rendering state attached to a flow.
///
/// The persistence core stores it as a single JSON document and never looks
/// inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiContainer {
    pub action: String,
    pub method: String,
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

impl UiContainer {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            method: "POST".to_string(),
            nodes: Vec::new(),
            messages: Vec::new(),
        }
    }
}

/// A login attempt that spans several request/response round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginFlow {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub request_url: String,
    pub active: bool,
    pub forced: bool,
    pub flow_type: FlowType,
    pub ui: UiContainer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_status_uses_lowercase_names() {
        assert_eq!(MessageStatus::Processing.to_string(), "processing");
        assert_eq!(
            MessageStatus::from_str("sent").unwrap(),
            MessageStatus::Sent
        );
        assert!(MessageStatus::from_str("delivered").is_err());
    }

    #[test]
    fn new_message_is_unassigned_and_queued() {
        let msg = Message::email("a@example.com", "hi", "body");
        assert!(msg.id.is_nil());
        assert!(msg.tenant_id.is_nil());
        assert_eq!(msg.status, MessageStatus::Queued);
        assert_eq!(msg.message_type, MessageType::Email);
    }

    #[test]
    fn tenant_id_parses_from_uuid_string() {
        let id = TenantId::new_v4();
        let parsed: TenantId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<TenantId>().is_err());
    }

    #[test]
    fn sent_is_terminal() {
        for next in [
            MessageStatus::Queued,
            MessageStatus::Processing,
            MessageStatus::Sent,
        ] {
            assert!(!MessageStatus::Sent.can_transition_to(next));
        }
    }

    #[test]
    fn ui_container_serializes_as_single_document() {
        let ui = UiContainer::new("https://example.com/self-service/login");
        let json = serde_json::to_string(&ui).unwrap();
        let back: UiContainer = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, ui.action);
        assert_eq!(back.method, "POST");
    }
}
