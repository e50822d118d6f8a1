//! # Identity Newtypes
//!
//! Newtype wrappers for every identifier namespace in the tracker. You
//! cannot pass an [`EntityId`] where a [`ComplianceId`] is expected.
//!
//! ## Representation
//!
//! Identifiers are opaque strings at the boundary. Records created by the
//! tracker get a full UUID v4 via `generate()`; ids minted elsewhere
//! (onboarding, catalog codes, fixtures such as `ent-001`) are accepted
//! verbatim as long as they are not blank.
//!
//! Deserialization routes through `new()`, so a blank id in a request body
//! is rejected at parse time rather than stored.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TrackerError;

/// Longest accepted identifier, in bytes.
pub const MAX_ID_LEN: usize = 128;

macro_rules! string_id {
    ($(#[$meta:meta])* $ty:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $ty(String);

        impl $ty {
            /// Id namespace used in error messages.
            pub const KIND: &'static str = $kind;

            /// Wrap an externally supplied identifier.
            ///
            /// Surrounding whitespace is trimmed. Blank or oversized values are rejected.
            pub fn new(raw: impl Into<String>) -> Result<Self, TrackerError> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(TrackerError::validation(concat!($kind, " id must not be empty")));
                }
                if trimmed.len() > MAX_ID_LEN {
                    return Err(TrackerError::validation(format!(
                        concat!($kind, " id must not exceed {} bytes"),
                        MAX_ID_LEN
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Access the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = TrackerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

macro_rules! generated_id {
    ($ty:ident) => {
        impl $ty {
            /// Generate a fresh identifier (UUID v4).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a legal business unit. Minted by onboarding.
    EntityId,
    "entity"
);
string_id!(
    /// Identifier of one compliance instance (entity + type + period).
    ComplianceId,
    "compliance"
);
string_id!(
    /// Catalog code of a compliance type, e.g. `MCA_ANNUAL_RETURN`.
    ComplianceTypeCode,
    "compliance type"
);
string_id!(
    /// Catalog code of a sellable service bundle.
    ServiceCode,
    "service"
);
string_id!(
    /// Identifier of an entity's subscription to a service.
    SubscriptionId,
    "subscription"
);
string_id!(
    /// Identifier of an uploaded document.
    DocumentId,
    "document"
);
string_id!(
    /// Identifier of a portal submission record.
    SubmissionId,
    "submission"
);
string_id!(
    /// Identifier of a back-office user acting on a record.
    UserId,
    "user"
);

generated_id!(EntityId);
generated_id!(ComplianceId);
generated_id!(SubscriptionId);
generated_id!(DocumentId);
generated_id!(SubmissionId);
