//! Typed identifier newtypes.
//!
//! Using newtypes prevents accidentally passing a `SessionId` where a
//! `ToolId` is expected — the mistake becomes a compile error instead of a
//! runtime surprise in a cache key or a log line.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

/// Newtype over a caller-supplied string identifier.
///
/// Unlike the UUID ids below, these cross a trust boundary (auth tokens,
/// session cookies, upstream request ids) and aren't necessarily UUIDs —
/// wrapping them still buys type safety, just not a generation scheme.
macro_rules! define_string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

define_uuid_id!(ToolId, "Unique identifier for a registered tool.");
define_uuid_id!(RunId, "Unique identifier for a single tool invocation.");

define_string_id!(TenantId, "Caller-supplied tenant identifier.");
define_string_id!(UserId, "Caller-supplied user identifier.");
define_string_id!(SessionId, "Caller-supplied session identifier.");
define_string_id!(TraceId, "Distributed tracing trace identifier.");
define_string_id!(SpanId, "Distributed tracing span identifier.");
