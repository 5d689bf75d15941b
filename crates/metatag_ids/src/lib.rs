//! Identifier wrappers for metatag.
//!
//! Database rows (libraries, files, rules, history) use SQLite integer ids.
//! Anything that lives only in process memory gets an opaque UUID instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error returned when a UUID-backed identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    label: &'static str,
    reason: String,
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid {}: {}", self.label, self.reason)
    }
}

impl std::error::Error for IdParseError {}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                let parsed = Uuid::parse_str(value.trim()).map_err(|e| IdParseError {
                    label: $label,
                    reason: e.to_string(),
                })?;
                Ok(Self(parsed.hyphenated().to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id!(
    /// Identity of a staged tag mutation. Assigned at enqueue time.
    PendingChangeId,
    "pending change ID"
);
