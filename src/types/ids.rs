//! Strongly-typed identifiers.
//!
//! All IDs are validated at construction time and implement common traits.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed ID newtype wrapper.
///
/// Generates: struct, `from_string()`, `as_str()`, Display, Serialize,
/// Deserialize, plus `new()` (UUID v4) and `Default`.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn from_string(s: String) -> Result<Self, &'static str> {
                if s.is_empty() {
                    return Err(concat!(stringify!($name), " cannot be empty"));
                }
                Ok(Self(s))
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
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(CallId);

/// Tool name with case-insensitive identity.
///
/// The original spelling is preserved for display and schema export; `key()`
/// yields the normalized form used for registry lookups and uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolName(String);

impl ToolName {
    pub fn from_string(s: String) -> Result<Self, &'static str> {
        if s.trim().is_empty() {
            return Err("ToolName cannot be empty");
        }
        Ok(Self(s))
    }

    /// Original spelling, as registered.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized (lowercased) form used as the registry key.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Normalize an arbitrary lookup string the same way as `key()`.
    pub fn normalize(s: &str) -> String {
        s.to_lowercase()
    }
}

impl PartialEq for ToolName {
    fn eq(&self, other: &Self) -> bool {
        // Same normalization as `key()`: equal names always share a
        // registry key and vice versa, including non-ASCII spellings.
        self.key() == other.key()
    }
}

impl Eq for ToolName {}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
