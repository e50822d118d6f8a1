//! # Entity Model
//!
//! A legal business unit subject to statutory filings. Entities are
//! created by onboarding and are immutable for the tracker's purposes;
//! every other record refers to them by [`EntityId`] only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::identity::EntityId;

/// Legal form of an entity. Drives which compliance types can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    PrivateLimited,
    PublicLimited,
    Llp,
    Proprietorship,
}

impl EntityType {
    /// Return the wire representation of this entity type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrivateLimited => "PRIVATE_LIMITED",
            Self::PublicLimited => "PUBLIC_LIMITED",
            Self::Llp => "LLP",
            Self::Proprietorship => "PROPRIETORSHIP",
        }
    }

    /// Return all entity types.
    pub fn all() -> &'static [EntityType] {
        &[
            Self::PrivateLimited,
            Self::PublicLimited,
            Self::Llp,
            Self::Proprietorship,
        ]
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statutory registration an entity may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationKind {
    /// Corporate Identification Number (companies only).
    Cin,
    /// Goods and Services Tax registration.
    Gst,
    /// Permanent Account Number (income tax).
    Pan,
}

impl std::fmt::Display for RegistrationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cin => "CIN",
            Self::Gst => "GST",
            Self::Pan => "PAN",
        };
        f.write_str(s)
    }
}

/// Registration numbers held by an entity. Each is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registrations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,
}

impl Registrations {
    /// The raw value for a registration kind, if any.
    pub fn get(&self, kind: RegistrationKind) -> Option<&str> {
        match kind {
            RegistrationKind::Cin => self.cin.as_deref(),
            RegistrationKind::Gst => self.gst.as_deref(),
            RegistrationKind::Pan => self.pan.as_deref(),
        }
    }

    /// Whether the entity carries a non-blank value for `kind`.
    pub fn has(&self, kind: RegistrationKind) -> bool {
        self.get(kind).is_some_and(|v| !v.trim().is_empty())
    }
}

/// A legal business unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub registrations: Registrations,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incorporation_date: Option<NaiveDate>,
}

impl Entity {
    /// Create an entity with no registrations.
    pub fn new(id: EntityId, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id,
            name: name.into(),
            entity_type,
            registrations: Registrations::default(),
            incorporation_date: None,
        }
    }

    /// Builder-style setter for a registration number.
    pub fn with_registration(mut self, kind: RegistrationKind, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match kind {
            RegistrationKind::Cin => self.registrations.cin = value,
            RegistrationKind::Gst => self.registrations.gst = value,
            RegistrationKind::Pan => self.registrations.pan = value,
        }
        self
    }

    /// Builder-style setter for the incorporation date.
    pub fn with_incorporation_date(mut self, date: NaiveDate) -> Self {
        self.incorporation_date = Some(date);
        self
    }

    /// Whether the entity carries a non-blank registration of `kind`.
    pub fn has_registration(&self, kind: RegistrationKind) -> bool {
        self.registrations.has(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entity {
        Entity::new(
            EntityId::new("ent-001").unwrap(),
            "Acme Technologies Pvt Ltd",
            EntityType::PrivateLimited,
        )
        .with_registration(RegistrationKind::Cin, "U72900KA2019PTC123456")
        .with_registration(RegistrationKind::Pan, "AABCA1234C")
    }

    #[test]
    fn has_registration_requires_non_blank_value() {
        let entity = sample().with_registration(RegistrationKind::Gst, "   ");
        assert!(entity.has_registration(RegistrationKind::Cin));
        assert!(entity.has_registration(RegistrationKind::Pan));
        assert!(!entity.has_registration(RegistrationKind::Gst));
    }

    #[test]
    fn entity_type_wire_format() {
        let json = serde_json::to_string(&EntityType::PrivateLimited).unwrap();
        assert_eq!(json, "\"PRIVATE_LIMITED\"");
        let llp: EntityType = serde_json::from_str("\"LLP\"").unwrap();
        assert_eq!(llp, EntityType::Llp);
        for ty in EntityType::all() {
            let s = serde_json::to_string(ty).unwrap();
            assert_eq!(s, format!("\"{}\"", ty.as_str()));
        }
    }

    #[test]
    fn missing_registrations_deserialize_as_empty() {
        let entity: Entity = serde_json::from_str(
            r#"{"id":"ent-003","name":"Sharma Traders","entity_type":"PROPRIETORSHIP"}"#,
        )
        .unwrap();
        assert_eq!(entity.registrations, Registrations::default());
        assert!(!entity.has_registration(RegistrationKind::Gst));
    }
}
