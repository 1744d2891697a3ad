// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Column maps for the persisted domain types.

use rusqlite::Row;
use rusqlite::types::Value;
use uuid::Uuid;
use warden_core::{LoginFlow, Message, TenantId, WardenError};

use crate::codec::{encode_json, encode_time, enum_at, json_at, opt_json_at, time_at, uuid_at};
use crate::entity::Entity;

fn json_err(e: serde_json::Error) -> WardenError {
    WardenError::Storage {
        source: Box::new(e),
    }
}

impl Entity for Message {
    const TABLE: &'static str = "courier_messages";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "nid",
        "status",
        "type",
        "recipient",
        "subject",
        "body",
        "template_type",
        "template_data",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }

    fn values(&self) -> Result<Vec<(&'static str, Value)>, WardenError> {
        let template_data = match &self.template_data {
            Some(data) => encode_json(data).map_err(json_err)?,
            None => Value::Null,
        };
        Ok(vec![
            ("status", Value::Text(self.status.to_string())),
            ("type", Value::Text(self.message_type.to_string())),
            ("recipient", Value::Text(self.recipient.clone())),
            ("subject", Value::Text(self.subject.clone())),
            ("body", Value::Text(self.body.clone())),
            (
                "template_type",
                self.template_type.clone().map_or(Value::Null, Value::Text),
            ),
            ("template_data", template_data),
            ("created_at", encode_time(&self.created_at)?),
            ("updated_at", encode_time(&self.updated_at)?),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Message {
            id: uuid_at(row, 0)?,
            tenant_id: TenantId(uuid_at(row, 1)?),
            status: enum_at(row, 2)?,
            message_type: enum_at(row, 3)?,
            recipient: row.get(4)?,
            subject: row.get(5)?,
            body: row.get(6)?,
            template_type: row.get(7)?,
            template_data: opt_json_at(row, 8)?,
            created_at: time_at(row, 9)?,
            updated_at: time_at(row, 10)?,
        })
    }
}

impl Entity for LoginFlow {
    const TABLE: &'static str = "selfservice_login_flows";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "nid",
        "issued_at",
        "expires_at",
        "request_url",
        "active",
        "forced",
        "type",
        "ui",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant: TenantId) {
        self.tenant_id = tenant;
    }

    fn values(&self) -> Result<Vec<(&'static str, Value)>, WardenError> {
        Ok(vec![
            ("issued_at", encode_time(&self.issued_at)?),
            ("expires_at", encode_time(&self.expires_at)?),
            ("request_url", Value::Text(self.request_url.clone())),
            ("active", Value::Integer(i64::from(self.active))),
            ("forced", Value::Integer(i64::from(self.forced))),
            ("type", Value::Text(self.flow_type.to_string())),
            ("ui", encode_json(&self.ui).map_err(json_err)?),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(LoginFlow {
            id: uuid_at(row, 0)?,
            tenant_id: TenantId(uuid_at(row, 1)?),
            issued_at: time_at(row, 2)?,
            expires_at: time_at(row, 3)?,
            request_url: row.get(4)?,
            active: row.get(5)?,
            forced: row.get(6)?,
            flow_type: enum_at(row, 7)?,
            ui: json_at(row, 8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writable<E: Entity>() -> Vec<&'static str> {
        E::COLUMNS.iter().copied().skip(2).collect()
    }

    #[test]
    fn column_maps_cover_every_selected_column() {
        let msg = Message::email("a@example.com", "s", "b");
        let names: Vec<_> = msg.values().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, writable::<Message>());

        let flow = LoginFlow::default();
        let names: Vec<_> = flow.values().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, writable::<LoginFlow>());
    }

    #[test]
    fn key_columns_lead_the_select_list() {
        assert_eq!(&Message::COLUMNS[..2], &["id", "nid"]);
        assert_eq!(&LoginFlow::COLUMNS[..2], &["id", "nid"]);
    }

    #[test]
    fn absent_template_fields_encode_as_null() {
        let msg = Message::email("a@example.com", "s", "b");
        let values = msg.values().unwrap();
        let lookup = |name: &str| values.iter().find(|(n, _)| *n == name).map(|(_, v)| v.clone());
        assert_eq!(lookup("template_type"), Some(Value::Null));
        assert_eq!(lookup("template_data"), Some(Value::Null));
    }
}
