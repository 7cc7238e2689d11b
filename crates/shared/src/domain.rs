use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Identifier as it appears on the wire: the backend is inconsistent about
/// sending ids as JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Int(i64),
    Float(f64),
    Text(String),
}

impl LooseId {
    fn into_string(self) -> String {
        match self {
            Self::Int(value) => value.to_string(),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                format!("{}", value as i64)
            }
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value,
        }
    }
}

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                // Numeric ids go back out as numbers so the backend sees what it sent.
                match self.0.parse::<i64>() {
                    Ok(numeric) if numeric.to_string() == self.0 => serializer.serialize_i64(numeric),
                    _ => serializer.serialize_str(&self.0),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                LooseId::deserialize(deserializer).map(|raw| Self(raw.into_string()))
            }
        }
    };
}

id_newtype!(EventId);
id_newtype!(UserId);
id_newtype!(SlotId);
id_newtype!(PollId);
id_newtype!(ChoiceId);
id_newtype!(ExpenseId);

impl UserId {
    /// Client-generated participant identifier; the backend trusts it as-is.
    pub fn generate() -> Self {
        Self(format!("user_{}", Uuid::new_v4().simple()))
    }
}

pub fn generate_group_id() -> String {
    format!("group_{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotChoice {
    Yes,
    No,
}

impl SlotChoice {
    pub const ALL: [SlotChoice; 2] = [SlotChoice::Yes, SlotChoice::No];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl fmt::Display for SlotChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown slot choice '{0}', expected 'yes' or 'no'")]
pub struct ParseSlotChoiceError(pub String);

impl FromStr for SlotChoice {
    type Err = ParseSlotChoiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(ParseSlotChoiceError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Moderator,
    Member,
}
