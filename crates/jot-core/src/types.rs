//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The tag name contained characters outside the allowed set.
    #[error("tag name may only contain letters, digits, '-' and '_', got {value:?}")]
    InvalidTagName { value: String },

    /// Invalid item kind value.
    #[error("invalid item kind: {value}")]
    InvalidItemKind { value: String },
}

/// The kind of item a classification rule suggests.
///
/// This enum encodes the valid suggestion targets, preventing invalid string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Something to do.
    Task,
    /// Something to keep.
    Note,
}

impl ItemKind {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "note" => Ok(Self::Note),
            _ => Err(ValidationError::InvalidItemKind {
                value: s.to_string(),
            }),
        }
    }
}

/// The kind a captured item is stored under.
///
/// Captures without a user override or a rule suggestion land in the inbox
/// for later triage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureKind {
    /// Something to do.
    Task,
    /// Something to keep.
    Note,
    /// Not yet triaged.
    Inbox,
}

impl CaptureKind {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
            Self::Inbox => "inbox",
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CaptureKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "note" => Ok(Self::Note),
            "inbox" => Ok(Self::Inbox),
            _ => Err(ValidationError::InvalidItemKind {
                value: s.to_string(),
            }),
        }
    }
}

impl From<ItemKind> for CaptureKind {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Task => Self::Task,
            ItemKind::Note => Self::Note,
        }
    }
}

fn validate_tag_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field: "tag name" });
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(ValidationError::InvalidTagName {
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_project_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty {
            field: "project name",
        });
    }
    Ok(())
}

/// Generates a validated name newtype with common trait implementations.
macro_rules! define_marker_name {
    (
        $(#[$meta:meta])*
        $name:ident, $validate:path
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new name after validation.
            pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
                let name = name.into();
                $validate(&name)?;
                Ok(Self(name))
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_marker_name!(
    /// A validated tag name.
    ///
    /// Tag names are restricted to ASCII letters, digits, hyphens, and
    /// underscores. A `#` marker whose name falls outside this set is not an
    /// error; it demotes the whole token to plain content at parse time.
    TagName, validate_tag_name
);

define_marker_name!(
    /// A validated project name.
    ///
    /// Project names may contain any characters (spaces included, when the
    /// capture quoted them) but must be non-empty after quote stripping.
    ProjectName, validate_project_name
);
