// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixture builders. Returned records are unsaved: id and tenant are nil.

use chrono::{DateTime, Duration, Utc};
use warden_core::{FlowType, LoginFlow, Message, MessageType, UiContainer};

/// A recovery-code email addressed to `user{n}@example.com`.
pub fn fake_message(n: usize) -> Message {
    Message {
        message_type: MessageType::Email,
        recipient: format!("user{n}@example.com"),
        subject: format!("Your recovery code #{n}"),
        body: format!("Use code {:06} to recover your account.", n * 7919 % 1_000_000),
        template_type: Some("recovery_code_valid".to_string()),
        template_data: Some(serde_json::json!({ "to": format!("user{n}@example.com"), "n": n })),
        ..Default::default()
    }
}

/// A browser login flow issued at `issued_at`, valid for ten minutes, with a
/// one-field identifier form.
pub fn fake_login_flow(issued_at: DateTime<Utc>) -> LoginFlow {
    let mut ui = UiContainer::new("https://auth.example.com/self-service/login?flow=");
    ui.nodes.push(serde_json::json!({
        "type": "input",
        "group": "default",
        "attributes": { "name": "identifier", "type": "text", "required": true }
    }));
    LoginFlow {
        issued_at,
        expires_at: issued_at + Duration::minutes(10),
        request_url: "https://auth.example.com/self-service/login/browser".to_string(),
        active: true,
        forced: false,
        flow_type: FlowType::Browser,
        ui,
        ..Default::default()
    }
}
